use std::collections::{HashMap, HashSet};

use bevy::prelude::*;
use bevy::render::alpha::AlphaMode;
use constants::render_settings::{
    HUD_ACTIVE_COLOUR, HUD_CLEAR_COLOUR, HUD_IDLE_COLOUR, RETICLE_COLOUR, RETICLE_INNER_RADIUS,
    RETICLE_OUTER_RADIUS,
};

use super::controller::{ArModeController, SceneView};
use super::frame_clock::FrameClock;
use super::hud::HudControl;
use super::pose::Pose;
use super::registry::InstanceId;
use super::ArPlacementSet;
use crate::engine::model::ModelAssets;
use crate::engine::settings::SceneSettings;

// Components
#[derive(Component)]
pub struct Reticle;

#[derive(Component)]
pub struct PlacementPreview;

/// Scene instance mirroring one registry entry.
#[derive(Component)]
pub struct PlacedModel {
    pub id: InstanceId,
}

#[derive(Component)]
pub struct HudButton(pub HudControl);

#[derive(Resource)]
pub struct HudMaterials {
    idle: Handle<StandardMaterial>,
    active: Handle<StandardMaterial>,
    clear: Handle<StandardMaterial>,
}

fn unlit(colour: [f32; 4]) -> StandardMaterial {
    StandardMaterial {
        base_color: Color::linear_rgba(colour[0], colour[1], colour[2], colour[3]),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        cull_mode: None,
        ..default()
    }
}

pub fn spawn_ar_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    model: Res<ModelAssets>,
    controller: Res<ArModeController>,
) {
    // Annulus lies in XY; the child turns it onto the surface plane
    commands
        .spawn((
            Reticle,
            Name::new("Reticle"),
            Transform::default(),
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(meshes.add(Annulus::new(RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS))),
                MeshMaterial3d(materials.add(unlit(RETICLE_COLOUR))),
                Transform::from_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
            ));
        });

    commands.spawn((
        PlacementPreview,
        Name::new("PlacementPreview"),
        SceneRoot(model.scene.clone()),
        Transform::default(),
        Visibility::Hidden,
    ));

    let hud_materials = HudMaterials {
        idle: materials.add(unlit(HUD_IDLE_COLOUR)),
        active: materials.add(unlit(HUD_ACTIVE_COLOUR)),
        clear: materials.add(unlit(HUD_CLEAR_COLOUR)),
    };

    let size = controller.config().hud.control_size;
    for control in HudControl::ALL {
        let material = match control {
            HudControl::ClearScene => hud_materials.clear.clone(),
            HudControl::TogglePlacement => hud_materials.idle.clone(),
        };
        commands.spawn((
            HudButton(control),
            Name::new(control.label()),
            Mesh3d(meshes.add(Rectangle::new(size, size))),
            MeshMaterial3d(material),
            Transform::default(),
            Visibility::Hidden,
        ));
    }

    commands.insert_resource(hud_materials);
}

fn scaled(pose: Pose, settings: &SceneSettings) -> Transform {
    pose.to_transform().with_scale(Vec3::splat(settings.scale))
}

/// Reticle shows only while locked onto a surface with placement on.
pub fn sync_reticle(
    controller: Res<ArModeController>,
    mut reticle: Query<(&mut Transform, &mut Visibility), With<Reticle>>,
) {
    let Ok((mut transform, mut visibility)) = reticle.single_mut() else {
        return;
    };

    match controller.view() {
        SceneView::ArPreview {
            surface,
            preview: Some(pose),
            ..
        } if surface.detected => {
            *transform = pose.to_transform();
            *visibility = Visibility::Visible;
        }
        _ => *visibility = Visibility::Hidden,
    }
}

/// Preview model: on the surface when locked, floating in front otherwise.
pub fn sync_preview(
    controller: Res<ArModeController>,
    settings: Res<SceneSettings>,
    mut preview: Query<(&mut Transform, &mut Visibility), With<PlacementPreview>>,
) {
    let Ok((mut transform, mut visibility)) = preview.single_mut() else {
        return;
    };

    match controller.preview_pose() {
        Some(pose) => {
            *transform = scaled(pose, &settings);
            *visibility = Visibility::Visible;
        }
        None => *visibility = Visibility::Hidden,
    }
}

/// Reconcile placed scene instances with the registry, keyed by id.
pub fn sync_placed_models(
    mut commands: Commands,
    controller: Res<ArModeController>,
    settings: Res<SceneSettings>,
    model: Res<ModelAssets>,
    mut placed: Query<(Entity, &PlacedModel, &mut Transform, &mut Visibility)>,
) {
    let wanted: HashMap<&InstanceId, Pose> = controller
        .registry()
        .list()
        .iter()
        .map(|instance| (instance.id(), instance.pose()))
        .collect();

    let visibility_now = if controller.is_ar_active() {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };

    let mut present = HashSet::with_capacity(wanted.len());
    for (entity, placed_model, mut transform, mut visibility) in &mut placed {
        match wanted.get(&placed_model.id) {
            Some(pose) => {
                *transform = scaled(*pose, &settings);
                *visibility = visibility_now;
                present.insert(placed_model.id.clone());
            }
            None => commands.entity(entity).despawn(),
        }
    }

    for instance in controller.registry().list() {
        if present.contains(instance.id()) {
            continue;
        }
        commands.spawn((
            PlacedModel {
                id: instance.id().clone(),
            },
            Name::new(format!("placed_{}", instance.id())),
            SceneRoot(model.scene.clone()),
            scaled(instance.pose(), &settings),
            visibility_now,
        ));
    }
}

/// Pin HUD quads to the camera and tint the toggle by placement state.
pub fn sync_hud(
    controller: Res<ArModeController>,
    clock: Res<FrameClock>,
    hud_materials: Option<Res<HudMaterials>>,
    mut buttons: Query<(
        &HudButton,
        &mut Transform,
        &mut Visibility,
        &mut MeshMaterial3d<StandardMaterial>,
    )>,
) {
    let hud = controller.config().hud;
    let ar_active = controller.is_ar_active();

    for (button, mut transform, mut visibility, mut material) in &mut buttons {
        if !ar_active {
            *visibility = Visibility::Hidden;
            continue;
        }

        *transform = hud.control_pose(button.0, &clock.camera).to_transform();
        *visibility = Visibility::Visible;

        if let (HudControl::TogglePlacement, Some(hud_materials)) = (button.0, &hud_materials) {
            material.0 = if controller.placement_enabled() {
                hud_materials.active.clone()
            } else {
                hud_materials.idle.clone()
            };
        }
    }
}

/// Meshes and scene instances for the AR layer.
pub struct ArVisualsPlugin;

impl Plugin for ArVisualsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_ar_visuals).add_systems(
            Update,
            (sync_reticle, sync_preview, sync_placed_models, sync_hud).after(ArPlacementSet),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::controller::PlacementOutcome;
    use crate::ar::log::ArLog;
    use crate::ar::platform::{
        ArPlatform, HitTestHandle, HitTestResolver, PlatformError, ReferenceSpaceKind,
        SelectGesture,
    };
    use std::time::Duration;

    /// Hit test that resolves at once and always reports the same surface.
    struct FixedHit(Option<Pose>);

    impl ArPlatform for FixedHit {
        fn request_hit_test_source(&mut self, _space: ReferenceSpaceKind, resolver: HitTestResolver) {
            resolver.resolve(Ok(HitTestHandle(1)));
        }

        fn poll_hit_test(
            &mut self,
            _handle: HitTestHandle,
            _frame: &FrameClock,
            _space: ReferenceSpaceKind,
        ) -> Option<Pose> {
            self.0
        }

        fn cancel_hit_test(&mut self, _handle: HitTestHandle) -> Result<(), PlatformError> {
            Ok(())
        }

        fn drain_select_gestures(&mut self) -> Vec<SelectGesture> {
            Vec::new()
        }
    }

    fn visuals_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(ArModeController::default())
            .insert_resource(SceneSettings::default())
            .insert_resource(ModelAssets {
                url: String::new(),
                scene: Handle::default(),
            })
            .add_systems(Update, (sync_reticle, sync_preview, sync_placed_models));
        app.world_mut()
            .spawn((Reticle, Transform::default(), Visibility::Hidden));
        app.world_mut()
            .spawn((PlacementPreview, Transform::default(), Visibility::Hidden));
        app
    }

    fn frame() -> FrameClock {
        FrameClock::new(1.0 / 60.0, Duration::ZERO, Pose::IDENTITY)
    }

    fn floor() -> Pose {
        Pose::from_translation(Vec3::new(0.0, -1.0, -2.0))
    }

    /// Enter AR and lock onto the floor.
    fn locked(app: &mut App, platform: &mut FixedHit, log: &mut ArLog) {
        let mut controller = app.world_mut().resource_mut::<ArModeController>();
        controller.enter_ar(platform, log);
        controller.tick(platform, &frame(), log);
    }

    fn place(app: &mut App, now: Duration, log: &mut ArLog) {
        let outcome = app
            .world_mut()
            .resource_mut::<ArModeController>()
            .attempt_placement(now, log);
        assert!(matches!(outcome, PlacementOutcome::Placed(_)), "{outcome:?}");
    }

    fn placed_visibility(app: &mut App) -> Vec<Visibility> {
        let mut query = app.world_mut().query::<(&PlacedModel, &Visibility)>();
        query.iter(app.world()).map(|(_, visibility)| *visibility).collect()
    }

    fn visibility_of<T: Component>(app: &mut App) -> Visibility {
        let mut query = app.world_mut().query_filtered::<&Visibility, With<T>>();
        *query.single(app.world()).unwrap()
    }

    #[test]
    fn clearing_despawns_placed_models() {
        let mut app = visuals_app();
        let mut platform = FixedHit(Some(floor()));
        let mut log = ArLog::default();
        locked(&mut app, &mut platform, &mut log);
        place(&mut app, Duration::from_millis(100), &mut log);
        place(&mut app, Duration::from_millis(200), &mut log);
        app.update();
        assert_eq!(placed_visibility(&mut app), vec![Visibility::Visible; 2]);

        app.world_mut()
            .resource_mut::<ArModeController>()
            .clear_scene(&mut log);
        app.update();

        assert!(placed_visibility(&mut app).is_empty());
    }

    #[test]
    fn leaving_ar_hides_placed_models() {
        let mut app = visuals_app();
        let mut platform = FixedHit(Some(floor()));
        let mut log = ArLog::default();
        locked(&mut app, &mut platform, &mut log);
        place(&mut app, Duration::from_millis(100), &mut log);
        app.update();

        app.world_mut()
            .resource_mut::<ArModeController>()
            .exit_ar(&mut platform, &mut log);
        app.update();

        assert_eq!(placed_visibility(&mut app), vec![Visibility::Hidden]);
        assert_eq!(visibility_of::<Reticle>(&mut app), Visibility::Hidden);
        assert_eq!(visibility_of::<PlacementPreview>(&mut app), Visibility::Hidden);
    }

    #[test]
    fn reticle_hidden_while_placement_off() {
        let mut app = visuals_app();
        let mut platform = FixedHit(Some(floor()));
        let mut log = ArLog::default();
        locked(&mut app, &mut platform, &mut log);
        app.update();
        assert_eq!(visibility_of::<Reticle>(&mut app), Visibility::Visible);
        assert_eq!(visibility_of::<PlacementPreview>(&mut app), Visibility::Visible);

        app.world_mut()
            .resource_mut::<ArModeController>()
            .toggle_placement_mode(&mut log);
        app.update();

        assert_eq!(visibility_of::<Reticle>(&mut app), Visibility::Hidden);
        assert_eq!(visibility_of::<PlacementPreview>(&mut app), Visibility::Hidden);
    }
}
