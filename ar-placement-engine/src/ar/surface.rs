use bevy::prelude::*;
use constants::ar_placement::{PREVIEW_EYE_DROP, PREVIEW_FOLLOW_DISTANCE, PREVIEW_FOLLOW_RATE};

use super::frame_clock::FrameClock;
use super::log::{ArLog, ArLogEvent};
use super::pose::Pose;

/// Where the floating preview hovers while no surface is found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewFollow {
    pub distance: f32,
    pub eye_drop: f32,
    /// Exponential smoothing rate (1/s).
    pub rate: f32,
}

impl Default for PreviewFollow {
    fn default() -> Self {
        Self {
            distance: PREVIEW_FOLLOW_DISTANCE,
            eye_drop: PREVIEW_EYE_DROP,
            rate: PREVIEW_FOLLOW_RATE,
        }
    }
}

impl PreviewFollow {
    /// Point `distance` ahead of the camera and `eye_drop` below it.
    pub fn target(&self, camera: &Pose) -> Vec3 {
        camera.position() + camera.forward() * self.distance - Vec3::Y * self.eye_drop
    }

    /// Frame-rate independent blend factor for a step of `dt` seconds.
    pub fn blend(&self, dt: f32) -> f32 {
        if dt <= 0.0 {
            return 0.0;
        }
        1.0 - (-self.rate * dt).exp()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SurfaceState {
    #[default]
    NoSurface,
    SurfaceLocked(Pose),
}

/// Read-only view of the tracker for rendering and frontends.
/// `pose` is `Some` exactly when `detected` is true.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSnapshot {
    pub detected: bool,
    pub pose: Option<Pose>,
    pub first_detection_fired: bool,
}

/// Per-frame surface state machine fed by hit-test results.
#[derive(Debug, Default)]
pub struct SurfaceTracker {
    state: SurfaceState,
    first_detection_fired: bool,
    follow_pose: Option<Pose>,
    follow: PreviewFollow,
}

impl SurfaceTracker {
    pub fn new(follow: PreviewFollow) -> Self {
        Self {
            follow,
            ..default()
        }
    }

    pub fn update(&mut self, hit: Option<Pose>, frame: &FrameClock, log: &mut ArLog) {
        match hit {
            Some(pose) => {
                if !self.first_detection_fired {
                    self.first_detection_fired = true;
                    log.push(ArLogEvent::SurfaceDetected);
                }
                self.state = SurfaceState::SurfaceLocked(pose);
                // Lost surfaces glide away from where the reticle last was
                self.follow_pose = Some(pose);
            }
            None => {
                self.state = SurfaceState::NoSurface;
                self.step_follow(frame);
            }
        }
    }

    /// Back to a fresh session: no surface, one-shot armed again.
    pub fn reset(&mut self) {
        self.state = SurfaceState::NoSurface;
        self.first_detection_fired = false;
        self.follow_pose = None;
    }

    /// Drop tracking while placement is off. The one-shot stays spent.
    pub fn suspend(&mut self) {
        self.state = SurfaceState::NoSurface;
        self.follow_pose = None;
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn detected(&self) -> bool {
        matches!(self.state, SurfaceState::SurfaceLocked(_))
    }

    /// Pose for the reticle and the preview model this frame.
    pub fn preview_pose(&self) -> Option<Pose> {
        match self.state {
            SurfaceState::SurfaceLocked(pose) => Some(pose),
            SurfaceState::NoSurface => self.follow_pose,
        }
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        let pose = match self.state {
            SurfaceState::SurfaceLocked(pose) => Some(pose),
            SurfaceState::NoSurface => None,
        };
        SurfaceSnapshot {
            detected: pose.is_some(),
            pose,
            first_detection_fired: self.first_detection_fired,
        }
    }

    fn step_follow(&mut self, frame: &FrameClock) {
        let target = self.follow.target(&frame.camera);

        let position = match self.follow_pose {
            Some(current) => current.position().lerp(target, self.follow.blend(frame.delta_secs)),
            None => target,
        };

        let previous = self.follow_pose.map(|pose| pose.orientation());
        let orientation = face_camera_yaw(position, frame.camera.position())
            .or(previous)
            .unwrap_or(Quat::IDENTITY);

        self.follow_pose = Some(Pose::new(position, orientation));
    }
}

/// Upright rotation turning +Z towards the camera, ignoring height.
fn face_camera_yaw(position: Vec3, camera: Vec3) -> Option<Quat> {
    let to_camera = Vec3::new(camera.x - position.x, 0.0, camera.z - position.z);
    if to_camera.length_squared() < 1e-6 {
        return None;
    }
    Some(Quat::from_rotation_y(to_camera.x.atan2(to_camera.z)))
}
