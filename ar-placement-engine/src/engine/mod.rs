//! Application shell around the AR core: exploration camera, model assets,
//! scene settings and app construction.

pub mod camera;
pub mod core;
pub mod model;
pub mod settings;

use bevy::prelude::*;

use camera::{OrbitCamera, orbit_camera_controller};
use model::{ModelAssets, spawn_exploration_model, update_exploration_model};
use settings::{SceneSettings, SettingsLoader, apply_light_settings, load_scene_settings};

/// Exploration mode: orbiting camera around an auto-rotating model.
pub struct ExplorationPlugin;

impl Plugin for ExplorationPlugin {
    fn build(&self, app: &mut App) {
        app
            // init resources
            .init_resource::<SceneSettings>()
            .init_resource::<SettingsLoader>()
            .init_resource::<OrbitCamera>()
            .init_resource::<ModelAssets>()
            .add_systems(Startup, spawn_exploration_model)
            .add_systems(
                Update,
                (
                    load_scene_settings,
                    apply_light_settings,
                    orbit_camera_controller.run_if(not_in_ar),
                    update_exploration_model,
                )
                    .chain()
                    .before(crate::ar::ArPlacementSet),
            );
    }
}

fn not_in_ar(controller: Res<crate::ar::ArModeController>) -> bool {
    !controller.is_ar_active()
}
