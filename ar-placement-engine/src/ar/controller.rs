use std::time::Duration;

use bevy::prelude::*;
use constants::ar_placement::GATE_COOLDOWN_MS;

use super::frame_clock::FrameClock;
use super::gate::InteractionGate;
use super::hit_test::HitTestSession;
use super::hud::{HudControl, HudOverlay};
use super::log::{ArLog, ArLogEvent};
use super::platform::ArPlatform;
use super::pose::Pose;
use super::registry::{InstanceId, PlacedInstance, PlacementRegistry};
use super::surface::{PreviewFollow, SurfaceSnapshot, SurfaceTracker};

/// Tunables for the placement core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArPlacementConfig {
    pub gate_cooldown: Duration,
    pub follow: PreviewFollow,
    pub hud: HudOverlay,
}

impl Default for ArPlacementConfig {
    fn default() -> Self {
        Self {
            gate_cooldown: Duration::from_millis(GATE_COOLDOWN_MS),
            follow: PreviewFollow::default(),
            hud: HudOverlay::default(),
        }
    }
}

/// Everything that lives exactly as long as one AR session.
#[derive(Debug)]
pub struct ArSession {
    hit_test: HitTestSession,
    tracker: SurfaceTracker,
    gate: InteractionGate,
    placement_enabled: bool,
}

impl ArSession {
    fn new(follow: PreviewFollow) -> Self {
        Self {
            hit_test: HitTestSession::default(),
            tracker: SurfaceTracker::new(follow),
            gate: InteractionGate::default(),
            placement_enabled: true,
        }
    }

    pub fn placement_enabled(&self) -> bool {
        self.placement_enabled
    }

    pub fn surface(&self) -> SurfaceSnapshot {
        self.tracker.snapshot()
    }

    pub fn gate(&self) -> &InteractionGate {
        &self.gate
    }

    pub fn hit_test(&self) -> &HitTestSession {
        &self.hit_test
    }
}

#[derive(Debug, Default)]
pub enum SceneMode {
    /// Orbit camera around a static model.
    #[default]
    Exploration,
    Ar(ArSession),
}

/// What the renderer should draw this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneView<'a> {
    Exploration,
    /// Placement on: reticle and preview plus everything already placed.
    ArPreview {
        surface: SurfaceSnapshot,
        preview: Option<Pose>,
        placed: &'a [PlacedInstance],
    },
    /// Placement off: placed instances only.
    ArPlaced { placed: &'a [PlacedInstance] },
}

/// Why a tap did not place anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementRejection {
    NotInAr,
    PlacementDisabled,
    GateBlocked,
    NoSurface,
    CommitFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    Placed(InstanceId),
    Rejected(PlacementRejection),
}

/// Owns the AR session state and the placed instances.
#[derive(Resource, Debug, Default)]
pub struct ArModeController {
    mode: SceneMode,
    registry: PlacementRegistry,
    config: ArPlacementConfig,
}

impl ArModeController {
    pub fn new(config: ArPlacementConfig) -> Self {
        Self {
            config,
            ..default()
        }
    }

    /// Start a fresh AR session. Hit-test trouble is logged, never refused.
    pub fn enter_ar(&mut self, platform: &mut dyn ArPlatform, log: &mut ArLog) {
        if self.is_ar_active() {
            self.exit_ar(platform, log);
        }

        let mut session = ArSession::new(self.config.follow);
        session.tracker.reset();
        session.hit_test.start(platform, log);
        platform.bind_select();

        self.mode = SceneMode::Ar(session);
        log.push(ArLogEvent::SessionStarted);
    }

    /// Leave AR. Placed instances are kept for the next session.
    pub fn exit_ar(&mut self, platform: &mut dyn ArPlatform, log: &mut ArLog) {
        let SceneMode::Ar(mut session) = std::mem::take(&mut self.mode) else {
            return;
        };
        platform.unbind_select();
        session.hit_test.stop(platform);
        log.push(ArLogEvent::SessionEnded);
    }

    /// Teardown hook; identical to leaving AR but silent when already out.
    pub fn dispose(&mut self, platform: &mut dyn ArPlatform, log: &mut ArLog) {
        self.exit_ar(platform, log);
    }

    /// Poll the hit test and advance the surface tracker for this frame.
    pub fn tick(&mut self, platform: &mut dyn ArPlatform, frame: &FrameClock, log: &mut ArLog) {
        let SceneMode::Ar(session) = &mut self.mode else {
            return;
        };
        if !session.placement_enabled {
            return;
        }

        let hit = session.hit_test.poll(platform, frame, log);
        session.tracker.update(hit, frame, log);
    }

    pub fn attempt_placement(&mut self, now: Duration, log: &mut ArLog) -> PlacementOutcome {
        let SceneMode::Ar(session) = &self.mode else {
            return PlacementOutcome::Rejected(PlacementRejection::NotInAr);
        };
        if !session.placement_enabled {
            return PlacementOutcome::Rejected(PlacementRejection::PlacementDisabled);
        }
        if !session.gate.try_consume(now) {
            debug!("Placement tap swallowed by interaction gate");
            return PlacementOutcome::Rejected(PlacementRejection::GateBlocked);
        }

        let Some(pose) = session.tracker.snapshot().pose else {
            log.push(ArLogEvent::FindSurfaceFirst);
            return PlacementOutcome::Rejected(PlacementRejection::NoSurface);
        };

        match self.registry.add(pose, now) {
            Ok(id) => {
                log.push(ArLogEvent::ModelPlaced);
                PlacementOutcome::Placed(id)
            }
            Err(err) => {
                log.push(ArLogEvent::PlacementFailed(err.to_string()));
                PlacementOutcome::Rejected(PlacementRejection::CommitFailed)
            }
        }
    }

    /// Flip placement mode. Returns the new state, or `None` outside AR.
    ///
    /// Not gated: a toggle followed by a quick world tap reaches placement.
    pub fn toggle_placement_mode(&mut self, log: &mut ArLog) -> Option<bool> {
        let SceneMode::Ar(session) = &mut self.mode else {
            return None;
        };

        session.placement_enabled = !session.placement_enabled;
        if !session.placement_enabled {
            session.tracker.suspend();
        }
        log.push(ArLogEvent::PlacementToggled(session.placement_enabled));
        Some(session.placement_enabled)
    }

    pub fn clear_scene(&mut self, log: &mut ArLog) {
        self.registry.clear();
        log.push(ArLogEvent::SceneCleared);
    }

    /// Pointer landed on a HUD control; start the lockout without acting yet.
    pub fn press_hud(&mut self, now: Duration) {
        let cooldown = self.config.gate_cooldown;
        if let SceneMode::Ar(session) = &mut self.mode {
            session.gate.block(now, cooldown);
        }
    }

    /// Run a HUD control. Blocks the gate first so the same gesture cannot
    /// also place a model.
    pub fn activate_hud(&mut self, control: HudControl, now: Duration, log: &mut ArLog) {
        if !self.is_ar_active() {
            return;
        }
        self.press_hud(now);

        match control {
            HudControl::ClearScene => self.clear_scene(log),
            HudControl::TogglePlacement => {
                self.toggle_placement_mode(log);
            }
        }
    }

    pub fn view(&self) -> SceneView<'_> {
        match &self.mode {
            SceneMode::Exploration => SceneView::Exploration,
            SceneMode::Ar(session) if session.placement_enabled => SceneView::ArPreview {
                surface: session.tracker.snapshot(),
                preview: session.tracker.preview_pose(),
                placed: self.registry.list(),
            },
            SceneMode::Ar(_) => SceneView::ArPlaced {
                placed: self.registry.list(),
            },
        }
    }

    pub fn mode(&self) -> &SceneMode {
        &self.mode
    }

    pub fn session(&self) -> Option<&ArSession> {
        match &self.mode {
            SceneMode::Ar(session) => Some(session),
            SceneMode::Exploration => None,
        }
    }

    pub fn is_ar_active(&self) -> bool {
        matches!(self.mode, SceneMode::Ar(_))
    }

    pub fn placement_enabled(&self) -> bool {
        self.session().is_some_and(ArSession::placement_enabled)
    }

    pub fn surface(&self) -> Option<SurfaceSnapshot> {
        self.session().map(ArSession::surface)
    }

    pub fn preview_pose(&self) -> Option<Pose> {
        match self.view() {
            SceneView::ArPreview { preview, .. } => preview,
            _ => None,
        }
    }

    pub fn registry(&self) -> &PlacementRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ArPlacementConfig {
        &self.config
    }
}
