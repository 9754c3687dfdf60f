// src/scatter/collision.rs
//! Brute-force separation test shared by the surface and painter samplers.
//! O(placed) per candidate; fine for tens to low hundreds of instances.

use bevy::math::Vec3;

/// A previously accepted placement as seen by the collision oracle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedPoint {
    pub position: Vec3,
    /// Bounding extent of the placed object, when known.
    pub extent: Option<f32>,
}

impl PlacedPoint {
    pub const fn new(position: Vec3, extent: Option<f32>) -> Self { Self { position, extent } }
}

/// True when `candidate` is closer to any placed point than the governing separation:
/// `max(reference_extent * factor, placed.extent)`. An unknown placed extent counts as
/// zero. Short-circuits on the first violation.
pub fn collides(candidate: Vec3, placed: &[PlacedPoint], reference_extent: f32, factor: f32) -> bool {
    let reference = (reference_extent * factor).max(0.0);
    placed.iter().any(|p| {
        let sep = reference.max(p.extent.unwrap_or(0.0));
        candidate.distance_squared(p.position) < sep * sep
    })
}
