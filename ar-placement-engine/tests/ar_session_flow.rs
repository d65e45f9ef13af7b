use std::sync::{Arc, Mutex};
use std::time::Duration;

use ar_placement_engine::ar::{
    ArCamera, ArCommand, ArLog, ArModeController, ArPlacementPlugin, ArPlatform, ArPlatformHost,
    FrameClock, HitTestHandle, HitTestResolver, HudControl, HudControlActivated, HudOverlay,
    PlacementAttempted, PlacementOutcome, PlacementRejection, PlatformError, Pose,
    ReferenceSpaceKind, SelectGesture,
};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

const FRAME: Duration = Duration::from_millis(100);

#[derive(Default)]
struct Script {
    hit: Option<Pose>,
    gestures: Vec<SelectGesture>,
    requests: u64,
    cancelled: Vec<HitTestHandle>,
    fail_requests: bool,
}

/// Platform double whose hit results and gestures are set by the test.
struct ScriptedPlatform(Arc<Mutex<Script>>);

impl ArPlatform for ScriptedPlatform {
    fn request_hit_test_source(&mut self, _space: ReferenceSpaceKind, resolver: HitTestResolver) {
        let mut script = self.0.lock().unwrap();
        script.requests += 1;
        if script.fail_requests {
            resolver.resolve(Err(PlatformError::Unsupported));
        } else {
            resolver.resolve(Ok(HitTestHandle(script.requests)));
        }
    }

    fn poll_hit_test(
        &mut self,
        _handle: HitTestHandle,
        _frame: &FrameClock,
        _space: ReferenceSpaceKind,
    ) -> Option<Pose> {
        self.0.lock().unwrap().hit
    }

    fn cancel_hit_test(&mut self, handle: HitTestHandle) -> Result<(), PlatformError> {
        self.0.lock().unwrap().cancelled.push(handle);
        Ok(())
    }

    fn drain_select_gestures(&mut self) -> Vec<SelectGesture> {
        std::mem::take(&mut self.0.lock().unwrap().gestures)
    }
}

#[derive(Resource, Default)]
struct Outcomes(Vec<PlacementOutcome>);

fn record_outcomes(mut events: EventReader<PlacementAttempted>, mut outcomes: ResMut<Outcomes>) {
    outcomes.0.extend(events.read().map(|event| event.0.clone()));
}

struct Harness {
    app: App,
    script: Arc<Mutex<Script>>,
}

impl Harness {
    fn new() -> Self {
        let script = Arc::new(Mutex::new(Script::default()));
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME))
            .add_plugins(ArPlacementPlugin::default())
            .insert_resource(ArPlatformHost::new(ScriptedPlatform(script.clone())))
            .init_resource::<Outcomes>()
            .add_systems(Update, record_outcomes.after(ar_placement_engine::ar::ArPlacementSet));
        app.world_mut()
            .spawn((ArCamera, Transform::default(), GlobalTransform::IDENTITY));

        Self { app, script }
    }

    fn command(&mut self, command: ArCommand) {
        self.app.world_mut().send_event(command);
        self.app.update();
    }

    fn set_hit(&self, hit: Option<Pose>) {
        self.script.lock().unwrap().hit = hit;
    }

    fn tap(&mut self, ray: Option<Ray3d>) -> PlacementOutcome {
        self.script.lock().unwrap().gestures.push(SelectGesture { ray });
        self.app.update();
        self.outcomes().last().cloned().unwrap()
    }

    fn controller(&self) -> &ArModeController {
        self.app.world().resource::<ArModeController>()
    }

    fn log(&self) -> &ArLog {
        self.app.world().resource::<ArLog>()
    }

    fn outcomes(&self) -> &[PlacementOutcome] {
        &self.app.world().resource::<Outcomes>().0
    }
}

fn floor_at(z: f32) -> Pose {
    Pose::from_translation(Vec3::new(0.0, -1.0, z))
}

fn ray_to_hud(control: HudControl) -> Ray3d {
    let camera = Pose::IDENTITY;
    let centre = HudOverlay::default().control_pose(control, &camera).position();
    Ray3d::new(camera.position(), Dir3::new(centre).unwrap())
}

#[test]
fn test_tap_without_surface_asks_to_find_one() {
    let mut harness = Harness::new();
    harness.command(ArCommand::EnterAr);

    let outcome = harness.tap(None);

    assert_eq!(outcome, PlacementOutcome::Rejected(PlacementRejection::NoSurface));
    assert!(harness.controller().registry().is_empty());
    assert_eq!(harness.log().last(), Some("Find a surface first"));
}

#[test]
fn test_tap_on_surface_places_at_reticle() {
    let mut harness = Harness::new();
    harness.command(ArCommand::EnterAr);
    harness.set_hit(Some(floor_at(-2.0)));
    harness.app.update();

    let outcome = harness.tap(None);

    let PlacementOutcome::Placed(id) = outcome else {
        panic!("expected a placement, got {outcome:?}");
    };
    let registry = harness.controller().registry();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.list()[0].id(), &id);
    assert_eq!(registry.list()[0].pose(), floor_at(-2.0));
    assert!(harness.log().contains("Model placed"));
}

#[test]
fn test_surface_detected_fires_once_per_session() {
    let mut harness = Harness::new();
    harness.command(ArCommand::EnterAr);

    for hit in [Some(floor_at(-1.0)), None, Some(floor_at(-1.5)), Some(floor_at(-1.2))] {
        harness.set_hit(hit);
        harness.app.update();
    }
    assert_eq!(harness.log().count("Surface detected!"), 1);

    harness.command(ArCommand::ExitAr);
    harness.command(ArCommand::EnterAr);
    harness.app.update();
    assert_eq!(harness.log().count("Surface detected!"), 2);
}

#[test]
fn test_detected_follows_latest_poll() {
    let mut harness = Harness::new();
    harness.command(ArCommand::EnterAr);

    harness.set_hit(Some(floor_at(-1.0)));
    harness.app.update();
    assert_eq!(
        harness.controller().surface().and_then(|s| s.pose),
        Some(floor_at(-1.0))
    );

    harness.set_hit(None);
    harness.app.update();
    let surface = harness.controller().surface().unwrap();
    assert!(!surface.detected);
    assert_eq!(surface.pose, None);
    // The preview keeps floating in front of the viewer
    assert!(harness.controller().preview_pose().is_some());
}

#[test]
fn test_hud_clear_swallows_same_gesture_placement() {
    let mut harness = Harness::new();
    harness.command(ArCommand::EnterAr);
    harness.set_hit(Some(floor_at(-2.0)));
    harness.app.update();
    assert!(matches!(harness.tap(None), PlacementOutcome::Placed(_)));

    let outcome = harness.tap(Some(ray_to_hud(HudControl::ClearScene)));

    assert_eq!(outcome, PlacementOutcome::Rejected(PlacementRejection::GateBlocked));
    assert!(harness.controller().registry().is_empty());
    assert!(harness.log().contains("Scene cleared"));
    assert!(!harness.log().contains("Find a surface first"));
}

#[test]
fn test_gate_reopens_after_cooldown() {
    let mut harness = Harness::new();
    harness.command(ArCommand::EnterAr);
    harness.set_hit(Some(floor_at(-2.0)));

    harness.app.world_mut().send_event(HudControlActivated {
        control: HudControl::ClearScene,
    });
    harness.app.update();

    // Blocked for the 500 ms window opened on that frame
    for _ in 0..4 {
        assert_eq!(
            harness.tap(None),
            PlacementOutcome::Rejected(PlacementRejection::GateBlocked)
        );
    }
    assert!(matches!(harness.tap(None), PlacementOutcome::Placed(_)));
}

#[test]
fn test_placement_off_ignores_taps() {
    let mut harness = Harness::new();
    harness.command(ArCommand::EnterAr);
    harness.set_hit(Some(floor_at(-2.0)));
    harness.app.update();

    harness.command(ArCommand::TogglePlacement);
    assert!(!harness.controller().placement_enabled());
    assert!(harness.controller().preview_pose().is_none());

    let outcome = harness.tap(None);

    assert_eq!(
        outcome,
        PlacementOutcome::Rejected(PlacementRejection::PlacementDisabled)
    );
    assert!(harness.controller().registry().is_empty());
    assert_eq!(harness.log().last(), Some("Placement Disabled"));
}

#[test]
fn test_instances_survive_exit_and_clear_issues_fresh_ids() {
    let mut harness = Harness::new();
    harness.command(ArCommand::EnterAr);
    harness.set_hit(Some(floor_at(-2.0)));
    harness.app.update();
    let PlacementOutcome::Placed(first) = harness.tap(None) else {
        panic!("first placement failed");
    };

    harness.command(ArCommand::ExitAr);
    assert!(!harness.controller().is_ar_active());
    assert_eq!(harness.controller().registry().len(), 1);
    assert_eq!(harness.script.lock().unwrap().cancelled, vec![HitTestHandle(1)]);

    harness.command(ArCommand::ClearScene);
    harness.command(ArCommand::EnterAr);
    harness.app.update();
    let PlacementOutcome::Placed(second) = harness.tap(None) else {
        panic!("second placement failed");
    };

    assert_ne!(first, second);
    assert_eq!(harness.controller().registry().len(), 1);
}

#[test]
fn test_app_exit_mid_session_releases_platform() {
    let mut harness = Harness::new();
    harness.command(ArCommand::EnterAr);
    harness.app.update();
    assert!(harness.script.lock().unwrap().cancelled.is_empty());

    harness.app.world_mut().send_event(AppExit::Success);
    harness.app.update();

    assert!(!harness.controller().is_ar_active());
    assert_eq!(harness.script.lock().unwrap().cancelled, vec![HitTestHandle(1)]);
    assert_eq!(harness.log().last(), Some("AR session ended"));
}

#[test]
fn test_failed_hit_test_source_still_enters_ar() {
    let mut harness = Harness::new();
    harness.script.lock().unwrap().fail_requests = true;
    harness.set_hit(Some(floor_at(-2.0)));

    harness.command(ArCommand::EnterAr);
    harness.app.update();

    assert!(harness.controller().is_ar_active());
    assert!(!harness.controller().surface().unwrap().detected);
    assert!(
        harness
            .log()
            .entries()
            .any(|line| line.starts_with("Hit test error:"))
    );
    assert_eq!(
        harness.tap(None),
        PlacementOutcome::Rejected(PlacementRejection::NoSurface)
    );
}

#[test]
fn test_taps_outside_ar_are_not_collected() {
    let mut harness = Harness::new();
    harness.script.lock().unwrap().gestures.push(SelectGesture { ray: None });
    harness.app.update();

    assert!(harness.outcomes().is_empty());
    assert!(harness.log().is_empty());
}
