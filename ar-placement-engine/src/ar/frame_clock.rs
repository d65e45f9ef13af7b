use std::time::Duration;

use bevy::prelude::*;

use super::pose::Pose;

/// Marker for the camera whose pose drives AR tracking and the HUD.
#[derive(Component, Default)]
pub struct ArCamera;

/// Per-frame timing and camera pose, sampled once at the start of the AR chain.
///
/// Written only by [`sample_frame_clock`]; every other AR system reads it.
#[derive(Resource, Debug, Clone, Copy)]
pub struct FrameClock {
    pub delta_secs: f32,
    pub elapsed: Duration,
    pub camera: Pose,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            delta_secs: 0.0,
            elapsed: Duration::ZERO,
            camera: Pose::IDENTITY,
        }
    }
}

impl FrameClock {
    pub fn new(delta_secs: f32, elapsed: Duration, camera: Pose) -> Self {
        Self {
            delta_secs,
            elapsed,
            camera,
        }
    }
}

/// Reads the camera's local [`Transform`] so a pose written earlier this
/// frame is seen before transform propagation runs. The AR camera is a root
/// entity, so local and world space coincide.
pub fn sample_frame_clock(
    time: Res<Time>,
    camera: Query<&Transform, With<ArCamera>>,
    mut clock: ResMut<FrameClock>,
) {
    clock.delta_secs = time.delta_secs();
    clock.elapsed = time.elapsed();

    // Keep the last known pose if the camera is missing for a frame
    if let Ok(camera_transform) = camera.single() {
        clock.camera = Pose::from(*camera_transform);
    }
}
