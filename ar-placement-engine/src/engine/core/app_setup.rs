use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;

// Placement core and its visuals
use crate::ar::visuals::ArVisualsPlugin;
use crate::ar::{ArCamera, ArPlacementConfig, ArPlacementPlugin};
// Exploration mode
use crate::engine::ExplorationPlugin;
use crate::engine::camera::OrbitCamera;
use crate::engine::core::app_config::AppConfig;
use crate::engine::core::window_config::create_window_config;
use crate::engine::settings::SceneSettings;
// Web RPC
use crate::rpc::web_rpc::WebRpcPlugin;

#[cfg(not(target_arch = "wasm32"))]
use crate::ar::desktop::DesktopArPlugin;

#[cfg(target_arch = "wasm32")]
use crate::rpc::webxr_bridge::WebXrBridgePlugin;

pub fn create_app(config: AppConfig) -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        // Registers SceneSettings as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<SceneSettings>::new(&["json"]))
        .insert_resource(config)
        .add_plugins(ArPlacementPlugin {
            config: ArPlacementConfig::default(),
        })
        .add_plugins(ExplorationPlugin)
        .add_plugins(ArVisualsPlugin)
        .add_plugins(WebRpcPlugin);

    // AR backend: the mouse emulator natively, the page's WebXR session on the web
    #[cfg(not(target_arch = "wasm32"))]
    app.add_plugins(DesktopArPlugin);

    #[cfg(target_arch = "wasm32")]
    app.add_plugins(WebXrBridgePlugin);

    app.add_systems(Startup, setup);

    app
}

fn spawn_lighting(commands: &mut Commands, settings: &SceneSettings) {
    commands.spawn((
        DirectionalLight {
            illuminance: settings.directional_intensity,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

fn spawn_camera(commands: &mut Commands, orbit: &OrbitCamera) {
    commands.spawn((
        Camera3d::default(),
        Name::new("ArCamera"),
        ArCamera,
        orbit.eye_transform(),
    ));
}

fn setup(mut commands: Commands, settings: Res<SceneSettings>, orbit: Res<OrbitCamera>) {
    info!("=== AR PLACEMENT ===");
    spawn_lighting(&mut commands, &settings);
    spawn_camera(&mut commands, &orbit);
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
