// src/scatter/placement/painter.rs
//! Brush dabs: polar sampling inside a disc, constrained to the surface.

use bevy::log::debug;
use bevy::math::Vec3;
use rand::Rng;

use super::{require_sources, RejectionPass, SampleOutcome, RESERVE_LIMIT};
use crate::scatter::collision::PlacedPoint;
use crate::scatter::core::{Frame, FrameBasis, Triangle, WORLD_UP};
use crate::scatter::error::ScatterError;
use crate::scatter::params::ScatterParameters;

/// One brush dab: center, radius and the plane the disc lies in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Brush {
    pub center: Vec3,
    pub radius: f32,
    /// Normal of the brush plane (world up for top-down painting).
    pub normal: Vec3,
}

impl Brush {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius, normal: WORLD_UP }
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }

    /// Polar draw: angle uniform in [0, 2pi), radius uniform in [0, radius].
    fn candidate<R: Rng + ?Sized>(&self, plane: &Frame, rng: &mut R) -> Vec3 {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let r = if self.radius > 0.0 { rng.random_range(0.0..=self.radius) } else { 0.0 };
        self.center + plane.x * (r * angle.cos()) + plane.y * (r * angle.sin())
    }
}

/// Up to `density` placements for one dab. `history` is everything already placed in
/// the group (earlier dabs included) and is only read; collision checks see it plus
/// this dab's own accepted points.
///
/// Frames come straight from the containing triangle's normal:
/// `z = normal`, `x = cross(world Y, z)`, `y = cross(z, x)`.
pub fn sample_brush_dab<R: Rng + ?Sized>(
    triangles: &[Triangle],
    brush: &Brush,
    density: usize,
    params: &ScatterParameters,
    footprints: &[f32],
    history: &[PlacedPoint],
    rng: &mut R,
) -> Result<SampleOutcome, ScatterError> {
    require_sources(footprints)?;

    let plane = Frame::from_normal(brush.center, brush.normal, FrameBasis::Surface);
    let pass = RejectionPass { triangles, requested: density, params, footprints, basis: FrameBasis::Brush };

    let mut seen = Vec::with_capacity(history.len() + density.min(RESERVE_LIMIT));
    seen.extend_from_slice(history);
    let outcome = pass.run(&mut seen, rng, |rng| brush.candidate(&plane, rng));

    debug!(
        "brush dab at {:?} r={:.2}: {}/{} placed ({} attempts)",
        brush.center,
        brush.radius,
        outcome.created(),
        density,
        outcome.attempts
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scatter::placement::ATTEMPTS_PER_PLACEMENT;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ground(size: f32) -> Vec<Triangle> {
        let a = Vec3::new(-size, -size, 0.0);
        let b = Vec3::new(size, -size, 0.0);
        let c = Vec3::new(size, size, 0.0);
        let d = Vec3::new(-size, size, 0.0);
        vec![Triangle::new(a, b, c), Triangle::new(a, c, d)]
    }

    #[test]
    fn dab_stays_inside_brush_disc() {
        let tris = ground(100.0);
        let brush = Brush::new(Vec3::new(10.0, -5.0, 0.0), 4.0);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let out = sample_brush_dab(&tris, &brush, 12, &ScatterParameters::default(), &[1.0], &[], &mut rng).unwrap();
        assert_eq!(out.created(), 12);
        for p in &out.placements {
            assert!(p.frame.origin.distance(brush.center) <= 4.0 + 1e-4);
            assert_eq!(p.basis, FrameBasis::Brush);
            assert!(p.frame.is_orthonormal(1e-4));
            assert!((p.frame.x - Vec3::X).length() < 1e-5);
        }
    }

    #[test]
    fn earlier_dabs_block_new_ones() {
        let tris = ground(100.0);
        let brush = Brush::new(Vec3::ZERO, 1.0);
        let params = ScatterParameters { collision: true, ..Default::default() };
        let history = [PlacedPoint::new(Vec3::ZERO, Some(10.0))];
        let mut rng = ChaCha8Rng::seed_from_u64(22);
        let out = sample_brush_dab(&tris, &brush, 5, &params, &[1.0], &history, &mut rng).unwrap();
        assert_eq!(out.created(), 0);
        assert!(out.is_partial());
        assert_eq!(out.attempts, 5 * ATTEMPTS_PER_PLACEMENT);
    }

    #[test]
    fn dab_off_the_surface_places_nothing() {
        let tris = ground(5.0);
        let brush = Brush::new(Vec3::new(50.0, 50.0, 0.0), 2.0);
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let out = sample_brush_dab(&tris, &brush, 4, &ScatterParameters::default(), &[1.0], &[], &mut rng).unwrap();
        assert_eq!(out.created(), 0);
    }

    #[test]
    fn tilted_surface_frames_follow_triangle_normal() {
        let n = Vec3::new(0.0, -1.0, 1.0).normalize();
        let tri = Triangle::new(Vec3::new(-10.0, -10.0, -10.0), Vec3::new(10.0, -10.0, -10.0), Vec3::new(0.0, 10.0, 10.0));
        let brush = Brush::new(Vec3::ZERO, 3.0).with_normal(n);
        let mut rng = ChaCha8Rng::seed_from_u64(24);
        let out = sample_brush_dab(&[tri], &brush, 6, &ScatterParameters::default(), &[1.0], &[], &mut rng).unwrap();
        assert_eq!(out.created(), 6);
        for p in &out.placements {
            assert!((p.frame.z - n).length() < 1e-5);
            assert!((p.frame.x - Vec3::Y.cross(n).normalize()).length() < 1e-5);
        }
    }
}
