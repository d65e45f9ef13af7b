use bevy::prelude::*;

use super::core::app_config::AppConfig;
use super::settings::SceneSettings;
use crate::ar::ArModeController;

/// The single glTF scene shared by exploration, preview and placed instances.
#[derive(Resource, Debug, Clone)]
pub struct ModelAssets {
    pub url: String,
    pub scene: Handle<Scene>,
}

impl FromWorld for ModelAssets {
    fn from_world(world: &mut World) -> Self {
        let url = world.get_resource::<AppConfig>().cloned().unwrap_or_default().model_url;
        let scene = world
            .resource::<AssetServer>()
            .load(GltfAssetLabel::Scene(0).from_asset(url.clone()));
        info!("Loading model scene from: {}", url);
        Self { url, scene }
    }
}

/// Model shown at the origin outside AR.
#[derive(Component)]
pub struct ExplorationModel;

pub fn spawn_exploration_model(
    mut commands: Commands,
    model: Res<ModelAssets>,
    settings: Res<SceneSettings>,
) {
    commands.spawn((
        ExplorationModel,
        Name::new("ExplorationModel"),
        SceneRoot(model.scene.clone()),
        Transform::from_scale(Vec3::splat(settings.scale)),
        Visibility::Visible,
    ));
}

/// Show the exploration model only outside AR and spin it when enabled.
pub fn update_exploration_model(
    controller: Res<ArModeController>,
    settings: Res<SceneSettings>,
    time: Res<Time>,
    mut models: Query<(&mut Transform, &mut Visibility), With<ExplorationModel>>,
) {
    let exploring = !controller.is_ar_active();

    for (mut transform, mut visibility) in &mut models {
        *visibility = if exploring {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };

        transform.scale = Vec3::splat(settings.scale);
        if exploring && settings.auto_rotate {
            transform.rotate_y(settings.rotation_speed * time.delta_secs());
        }
    }
}
