use std::fmt;
use std::time::Duration;

use thiserror::Error;

use super::pose::Pose;

/// Opaque id of a placed instance; unique, not meaningfully ordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedInstance {
    id: InstanceId,
    pose: Pose,
}

impl PlacedInstance {
    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error("pose has non-finite components: {0:?}")]
    NonFinitePose(Pose),
}

/// Placed model instances in insertion order.
#[derive(Debug, Default)]
pub struct PlacementRegistry {
    instances: Vec<PlacedInstance>,
    // Never reset, so ids stay unique across clears
    issued: u64,
}

impl PlacementRegistry {
    /// Store a copy of `pose` under a fresh id. Nothing changes on error.
    pub fn add(&mut self, pose: Pose, now: Duration) -> Result<InstanceId, PlacementError> {
        if !pose.is_finite() {
            return Err(PlacementError::NonFinitePose(pose));
        }

        self.issued += 1;
        let id = InstanceId(format!(
            "placed-{}-{}-{:08x}",
            now.as_millis(),
            self.issued,
            rand::random::<u32>()
        ));

        self.instances.push(PlacedInstance {
            id: id.clone(),
            pose,
        });
        Ok(id)
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn list(&self) -> &[PlacedInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn add_stores_a_copy_of_the_pose() {
        let mut registry = PlacementRegistry::default();
        let mut live = Pose::from_translation(Vec3::new(1.0, 0.0, -2.0));
        let placed = live;

        let id = registry.add(live, Duration::from_millis(10)).unwrap();
        live = Pose::from_translation(Vec3::new(9.0, 9.0, 9.0));

        let last = registry.list().last().unwrap();
        assert_eq!(last.id(), &id);
        assert_eq!(last.pose(), placed);
        assert_ne!(last.pose(), live);
    }

    #[test]
    fn keeps_insertion_order() {
        let mut registry = PlacementRegistry::default();
        let ids: Vec<_> = (0..4)
            .map(|i| {
                registry
                    .add(Pose::from_translation(Vec3::X * i as f32), Duration::ZERO)
                    .unwrap()
            })
            .collect();

        let listed: Vec<_> = registry.list().iter().map(|p| p.id().clone()).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn ids_are_never_reissued_after_clear() {
        let mut registry = PlacementRegistry::default();
        let mut seen = HashSet::new();

        for _ in 0..3 {
            seen.insert(registry.add(Pose::IDENTITY, Duration::ZERO).unwrap());
        }
        registry.clear();
        assert!(registry.list().is_empty());

        let fresh = registry.add(Pose::IDENTITY, Duration::ZERO).unwrap();
        assert!(!seen.contains(&fresh));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejected_add_leaves_registry_untouched() {
        let mut registry = PlacementRegistry::default();
        registry.add(Pose::IDENTITY, Duration::ZERO).unwrap();

        let bad = Pose::from_translation(Vec3::new(f32::INFINITY, 0.0, 0.0));
        assert!(matches!(
            registry.add(bad, Duration::ZERO),
            Err(PlacementError::NonFinitePose(_))
        ));
        assert_eq!(registry.len(), 1);
    }
}
