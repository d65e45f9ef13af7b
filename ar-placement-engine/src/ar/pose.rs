use bevy::prelude::*;

/// Rigid pose in the renderer's right-handed frame (+Y up, -Z forward).
///
/// Poses are values: tracking code derives a fresh one every frame and the
/// registry stores copies, so nothing placed ever follows a live pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    position: Vec3,
    orientation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_translation(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Direction the pose looks along.
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// Map a point from this pose's local frame into the parent frame.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.orientation.is_finite()
    }

    pub fn to_transform(&self) -> Transform {
        Transform {
            translation: self.position,
            rotation: self.orientation,
            scale: Vec3::ONE,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Transform> for Pose {
    fn from(transform: Transform) -> Self {
        Self::new(transform.translation, transform.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_follows_orientation() {
        let pose = Pose::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let forward = pose.forward();
        assert!((forward - Vec3::NEG_X).length() < 1e-5, "forward={forward:?}");
    }

    #[test]
    fn non_finite_components_are_detected() {
        assert!(Pose::IDENTITY.is_finite());
        assert!(!Pose::from_translation(Vec3::new(f32::NAN, 0.0, 0.0)).is_finite());
    }

    #[test]
    fn transform_round_trip_keeps_position_and_rotation() {
        let transform = Transform::from_xyz(1.0, 2.0, 3.0).with_rotation(Quat::from_rotation_x(0.3));
        let pose = Pose::from(transform);
        assert_eq!(pose.to_transform(), transform);
    }
}
