//! Exploration camera for inspecting the model outside AR.
//!
//! Provides orbit controls around a focus point with smooth interpolation.
//! The same camera entity carries `ArCamera`, so in AR it is the viewer whose
//! pose feeds surface tracking and the HUD.

/// Orbit camera resource and controller system.
pub mod orbit_camera;

pub use orbit_camera::{OrbitCamera, orbit_camera_controller};
