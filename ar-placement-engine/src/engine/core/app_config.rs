use bevy::prelude::*;

/// Where the app finds its model and scene settings.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// glTF or glb asset path or URL; scene 0 is used.
    pub model_url: String,
    /// JSON asset holding [`SceneSettings`](crate::engine::settings::SceneSettings).
    pub settings_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_url: "models/model.glb".to_string(),
            settings_path: "settings/scene.json".to_string(),
        }
    }
}

impl AppConfig {
    pub fn with_model_url(mut self, url: impl Into<String>) -> Self {
        self.model_url = url.into();
        self
    }

    pub fn with_settings_path(mut self, path: impl Into<String>) -> Self {
        self.settings_path = path.into();
        self
    }
}
