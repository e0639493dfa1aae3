//! Probe result structures.
//!
//! Environment probes report ray hits with these records. A miss is simply
//! `None`; there is no error case.

use bevy::prelude::*;

/// Information about a raycast hit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at the hit point.
    pub normal: Vec2,
    /// World position of the hit point.
    pub point: Vec2,
    /// Entity that was hit, when the backend knows it.
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a hit record.
    pub fn new(distance: f32, normal: Vec2, point: Vec2, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}

/// Distance of an optional hit, reporting zero for a miss.
///
/// Probes that find nothing degrade to a zero distance rather than failing.
#[inline]
pub fn hit_distance(hit: Option<CollisionData>) -> f32 {
    hit.map(|h| h.distance).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_distance_reads_through_to_the_hit() {
        let wall = Entity::from_raw(7);
        let hits = [
            (None, 0.0),
            (Some(CollisionData::new(0.0, Vec2::NEG_X, Vec2::new(1.0, 0.0), None)), 0.0),
            (Some(CollisionData::new(0.25, Vec2::NEG_X, Vec2::new(1.0, 0.0), Some(wall))), 0.25),
        ];

        for (hit, expected) in hits {
            assert_eq!(hit_distance(hit), expected, "{hit:?}");
        }
    }
}
