use bevy::prelude::*;
use constants::ar_placement::{
    HUD_CLEAR_SCENE_OFFSET, HUD_CONTROL_SIZE, HUD_TOGGLE_PLACEMENT_OFFSET,
};

use super::pose::Pose;

/// Camera-facing controls shown while in AR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HudControl {
    ClearScene,
    TogglePlacement,
}

impl HudControl {
    pub const ALL: [Self; 2] = [Self::ClearScene, Self::TogglePlacement];

    pub fn label(&self) -> &'static str {
        match self {
            Self::ClearScene => "Clear Scene",
            Self::TogglePlacement => "Toggle Placement",
        }
    }

    /// Convert string identifier to control for RPC compatibility.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "clear_scene" | "clear" => Some(Self::ClearScene),
            "toggle_placement" | "toggle" => Some(Self::TogglePlacement),
            _ => None,
        }
    }
}

/// Layout of the HUD quads in the camera's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudOverlay {
    pub clear_scene_offset: Vec3,
    pub toggle_placement_offset: Vec3,
    pub control_size: f32,
}

impl Default for HudOverlay {
    fn default() -> Self {
        Self {
            clear_scene_offset: HUD_CLEAR_SCENE_OFFSET,
            toggle_placement_offset: HUD_TOGGLE_PLACEMENT_OFFSET,
            control_size: HUD_CONTROL_SIZE,
        }
    }
}

impl HudOverlay {
    fn offset(&self, control: HudControl) -> Vec3 {
        match control {
            HudControl::ClearScene => self.clear_scene_offset,
            HudControl::TogglePlacement => self.toggle_placement_offset,
        }
    }

    /// World pose of `control`: pinned to the camera and sharing its rotation,
    /// so the quad's +Z always faces the viewer.
    pub fn control_pose(&self, control: HudControl, camera: &Pose) -> Pose {
        Pose::new(camera.transform_point(self.offset(control)), camera.orientation())
    }

    /// Nearest control crossed by `ray`, if any.
    pub fn pick(&self, camera: &Pose, ray: Ray3d) -> Option<HudControl> {
        HudControl::ALL
            .into_iter()
            .filter_map(|control| {
                let pose = self.control_pose(control, camera);
                ray_hits_quad(ray, &pose, self.control_size * 0.5).map(|t| (t, control))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, control)| control)
    }
}

/// Distance along `ray` to a square of half-extent `half` centred on `quad`
/// in its local XY plane.
fn ray_hits_quad(ray: Ray3d, quad: &Pose, half: f32) -> Option<f32> {
    let normal = quad.orientation() * Vec3::Z;
    let direction: Vec3 = *ray.direction;

    let denom = direction.dot(normal);
    if denom.abs() < 1e-6 {
        return None;
    }

    let t = (quad.position() - ray.origin).dot(normal) / denom;
    if t < 0.0 {
        return None;
    }

    let hit = ray.origin + direction * t;
    let local = quad.orientation().inverse() * (hit - quad.position());
    (local.x.abs() <= half && local.y.abs() <= half).then_some(t)
}
