//! Core application setup.
//!
//! Handles window configuration and plugin initialisation for both native
//! and WASM targets.

/// Model URL and settings path.
pub mod app_config;

/// Application setup and plugin configuration for the Bevy engine.
///
/// Creates the main app with the AR placement core, visuals, exploration mode
/// and the platform-specific AR backend.
pub mod app_setup;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
