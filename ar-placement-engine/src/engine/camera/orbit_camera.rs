use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::math::EulerRot;
use bevy::prelude::*;
use constants::render_settings::{
    ORBIT_DEFAULT_DISTANCE, ORBIT_DEFAULT_PITCH, ORBIT_MAX_DISTANCE, ORBIT_MIN_DISTANCE,
};

use crate::ar::ArCamera;

#[derive(Resource)]
pub struct OrbitCamera {
    pub focus_point: Vec3,
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            focus_point: Vec3::new(0.0, 0.5, 0.0),
            distance: ORBIT_DEFAULT_DISTANCE,
            pitch: ORBIT_DEFAULT_PITCH,
            yaw: 0.0,
        }
    }
}

impl OrbitCamera {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Camera transform orbiting `focus_point` at `distance`.
    pub fn eye_transform(&self) -> Transform {
        let rotation = self.rotation();
        let eye = self.focus_point + rotation * Vec3::Z * self.distance;
        Transform::from_translation(eye).with_rotation(rotation)
    }

    pub fn orbit(&mut self, delta: Vec2) {
        let yaw_sens = 0.0035;
        let pitch_sens = 0.0030;
        self.yaw += -delta.x * yaw_sens;
        self.pitch = (self.pitch - delta.y * pitch_sens).clamp(-1.55, 1.55);
    }

    pub fn zoom(&mut self, scroll: f32) {
        let step = (self.distance * 0.1).max(0.05);
        self.distance = (self.distance - scroll * step).clamp(ORBIT_MIN_DISTANCE, ORBIT_MAX_DISTANCE);
    }
}

/// Runs outside AR only; in AR the viewer pose owns the camera.
pub fn orbit_camera_controller(
    mut camera_query: Query<&mut Transform, With<ArCamera>>,
    mut orbit: ResMut<OrbitCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    time: Res<Time>,
) {
    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();

    // Mouse wheel scroll accumulation (pixel and line scroll)
    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }

    // Right drag orbits; left click stays free for select gestures
    if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
        orbit.orbit(mouse_delta);
    }
    if scroll_accum.abs() > f32::EPSILON {
        orbit.zoom(scroll_accum);
    }

    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let target = orbit.eye_transform();
    let lerp_speed = (12.0 * time.delta_secs()).min(1.0);
    camera_transform.translation = camera_transform.translation.lerp(target.translation, lerp_speed);
    camera_transform.rotation = camera_transform.rotation.slerp(target.rotation, lerp_speed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_looks_at_focus_point() {
        let orbit = OrbitCamera {
            yaw: 0.8,
            pitch: -0.3,
            ..default()
        };
        let eye = orbit.eye_transform();
        let to_focus = (orbit.focus_point - eye.translation).normalize();
        assert!((to_focus - eye.forward().as_vec3()).length() < 1e-4);
        assert!(((orbit.focus_point - eye.translation).length() - orbit.distance).abs() < 1e-4);
    }

    #[test]
    fn zoom_and_pitch_are_clamped() {
        let mut orbit = OrbitCamera::default();
        orbit.zoom(1_000.0);
        assert_eq!(orbit.distance, ORBIT_MIN_DISTANCE);
        orbit.orbit(Vec2::new(0.0, -10_000.0));
        assert!(orbit.pitch <= 1.55);
    }
}
