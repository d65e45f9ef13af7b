//! Scene settings loaded from JSON at startup.
//!
//! Until the asset resolves, the constants-backed defaults are in effect, so
//! the scene renders immediately and picks up the file once it arrives.

use bevy::prelude::*;
use constants::render_settings::{
    DEFAULT_AMBIENT_INTENSITY, DEFAULT_AUTO_ROTATE, DEFAULT_DIRECTIONAL_INTENSITY,
    DEFAULT_MODEL_SCALE, DEFAULT_ROTATION_SPEED,
};
use serde::Deserialize;

use super::core::app_config::AppConfig;

#[derive(Asset, TypePath, Resource, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SceneSettings {
    /// Uniform scale applied to the exploration, preview and placed models.
    pub scale: f32,
    /// Radians per second while auto-rotating in exploration.
    pub rotation_speed: f32,
    pub auto_rotate: bool,
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            scale: DEFAULT_MODEL_SCALE,
            rotation_speed: DEFAULT_ROTATION_SPEED,
            auto_rotate: DEFAULT_AUTO_ROTATE,
            ambient_intensity: DEFAULT_AMBIENT_INTENSITY,
            directional_intensity: DEFAULT_DIRECTIONAL_INTENSITY,
        }
    }
}

impl SceneSettings {
    /// Replace values that would break rendering with their defaults.
    pub fn sanitised(self) -> Self {
        let defaults = Self::default();
        let positive_or = |value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        let non_negative_or = |value: f32, fallback: f32| {
            if value.is_finite() && value >= 0.0 {
                value
            } else {
                fallback
            }
        };

        Self {
            scale: positive_or(self.scale, defaults.scale),
            rotation_speed: if self.rotation_speed.is_finite() {
                self.rotation_speed
            } else {
                defaults.rotation_speed
            },
            auto_rotate: self.auto_rotate,
            ambient_intensity: non_negative_or(self.ambient_intensity, defaults.ambient_intensity),
            directional_intensity: non_negative_or(
                self.directional_intensity,
                defaults.directional_intensity,
            ),
        }
    }
}

#[derive(Resource, Default)]
pub struct SettingsLoader {
    handle: Option<Handle<SceneSettings>>,
    loaded: bool,
}

impl SettingsLoader {
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// Start loading the settings JSON, then adopt it once available.
pub fn load_scene_settings(
    mut loader: ResMut<SettingsLoader>,
    mut commands: Commands,
    config: Res<AppConfig>,
    asset_server: Res<AssetServer>,
    settings_assets: Res<Assets<SceneSettings>>,
) {
    if loader.loaded {
        return;
    }

    let Some(handle) = loader.handle.clone() else {
        info!("Loading scene settings from: {}", config.settings_path);
        loader.handle = Some(asset_server.load(config.settings_path.clone()));
        return;
    };

    if let Some(settings) = settings_assets.get(&handle) {
        let settings = settings.sanitised();
        info!("Scene settings loaded: {:?}", settings);
        commands.insert_resource(settings);
        loader.loaded = true;
    } else if asset_server.load_state(&handle).is_failed() {
        warn!(
            "Scene settings at {} failed to load, keeping defaults",
            config.settings_path
        );
        loader.loaded = true;
    }
}

/// Keep light intensities in step with the active settings.
pub fn apply_light_settings(
    settings: Res<SceneSettings>,
    mut ambient: ResMut<AmbientLight>,
    mut lights: Query<&mut DirectionalLight>,
) {
    if !settings.is_changed() {
        return;
    }

    ambient.brightness = settings.ambient_intensity;
    for mut light in &mut lights {
        light.illuminance = settings.directional_intensity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: SceneSettings = serde_json::from_str(r#"{ "scale": 0.25 }"#).unwrap();
        assert_eq!(settings.scale, 0.25);
        assert_eq!(settings.rotation_speed, DEFAULT_ROTATION_SPEED);
        assert_eq!(settings.auto_rotate, DEFAULT_AUTO_ROTATE);
    }

    #[test]
    fn sanitising_rejects_zero_scale_and_negative_light() {
        let settings = SceneSettings {
            scale: 0.0,
            ambient_intensity: -5.0,
            ..default()
        }
        .sanitised();
        assert_eq!(settings.scale, DEFAULT_MODEL_SCALE);
        assert_eq!(settings.ambient_intensity, DEFAULT_AMBIENT_INTENSITY);
    }

    #[test]
    fn light_settings_follow_resource() {
        let mut app = App::new();
        app.insert_resource(SceneSettings {
            directional_intensity: 1234.0,
            ambient_intensity: 56.0,
            ..default()
        })
        .init_resource::<AmbientLight>()
        .add_systems(Update, apply_light_settings);
        let light = app.world_mut().spawn(DirectionalLight::default()).id();

        app.update();

        assert_eq!(app.world().resource::<AmbientLight>().brightness, 56.0);
        let illuminance = app.world().get::<DirectionalLight>(light).unwrap().illuminance;
        assert_eq!(illuminance, 1234.0);
    }
}
