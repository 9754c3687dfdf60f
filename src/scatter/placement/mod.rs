// src/scatter/placement/mod.rs
//! Samplers and the helpers they share: source picks, randomized results and the
//! attempts-bounded rejection loop used by the surface and painter paths.

use bevy::log::debug;
use bevy::math::Vec3;
use rand::Rng;

use super::collision::{collides, PlacedPoint};
use super::core::{Frame, FrameBasis, PlacementResult, Triangle};
use super::error::ScatterError;
use super::params::ScatterParameters;

mod curve;
mod painter;
mod surface;

pub use curve::{curve_instance_count, sample_along_curve};
pub use painter::{sample_brush_dab, Brush};
pub use surface::sample_on_surface;

/// Candidate attempts allowed per requested placement.
pub const ATTEMPTS_PER_PLACEMENT: usize = 10;

/// Most results reserved up front; larger passes grow as they accept.
pub(crate) const RESERVE_LIMIT: usize = 1024;

/// Result of a rejection-sampled pass. Falling short of `requested` is a partial
/// success, not an error.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleOutcome {
    pub placements: Vec<PlacementResult>,
    pub requested: usize,
    pub attempts: usize,
}

impl SampleOutcome {
    #[inline]
    pub fn created(&self) -> usize { self.placements.len() }

    #[inline]
    pub fn is_partial(&self) -> bool { self.created() < self.requested }
}

/// Uniform source index in `0..count`; `count` must be non-zero.
#[inline]
pub fn pick_source<R: Rng + ?Sized>(rng: &mut R, count: usize) -> usize {
    if count <= 1 { 0 } else { rng.random_range(0..count) }
}

/// Largest source footprint; the conservative reference for separation checks.
pub fn reference_extent(footprints: &[f32]) -> f32 {
    footprints.iter().copied().filter(|e| e.is_finite()).fold(0.0, f32::max)
}

/// First triangle (scan order) containing `p`, with its unit normal. Degenerate
/// triangles are skipped and the scan continues.
pub fn first_containing(triangles: &[Triangle], p: Vec3) -> Option<(usize, Vec3)> {
    for (i, tri) in triangles.iter().enumerate() {
        let Ok(normal) = tri.normal() else { continue };
        if let Ok(true) = tri.contains(p) {
            return Some((i, normal));
        }
    }
    None
}

/// Adds source pick, rotation and scale jitter to a frame.
pub(crate) fn randomize<R: Rng + ?Sized>(
    frame: Frame,
    normal: Option<Vec3>,
    basis: FrameBasis,
    params: &ScatterParameters,
    source_count: usize,
    rng: &mut R,
) -> PlacementResult {
    let source_index = pick_source(rng, source_count);
    let rotation = params.sample_rotation(rng);
    let scale = params.sample_scale(rng);
    PlacementResult { frame, rotation, scale, normal, basis, source_index }
}

/// Inputs shared by the surface and painter rejection loops.
pub(crate) struct RejectionPass<'a> {
    pub triangles: &'a [Triangle],
    pub requested: usize,
    pub params: &'a ScatterParameters,
    pub footprints: &'a [f32],
    pub basis: FrameBasis,
}

impl RejectionPass<'_> {
    /// Draws candidates until `requested` are accepted or `requested * 10` attempts are
    /// spent. Collision runs before containment so cheap rejections skip the face scan.
    /// Accepted points are appended to `history`.
    pub fn run<R, F>(&self, history: &mut Vec<PlacedPoint>, rng: &mut R, mut candidate: F) -> SampleOutcome
    where
        R: Rng + ?Sized,
        F: FnMut(&mut R) -> Vec3,
    {
        let max_attempts = self.requested.saturating_mul(ATTEMPTS_PER_PLACEMENT);
        let reference = reference_extent(self.footprints);
        let mut out = SampleOutcome {
            placements: Vec::with_capacity(self.requested.min(RESERVE_LIMIT)),
            requested: self.requested,
            attempts: 0,
        };

        let mut collided = 0usize;
        let mut missed = 0usize;

        while out.created() < self.requested && out.attempts < max_attempts {
            out.attempts += 1;
            let p = candidate(&mut *rng);

            if self.params.collision && collides(p, history, reference, self.params.collision_factor) {
                collided += 1;
                continue;
            }

            let Some((tri_index, normal)) = first_containing(self.triangles, p) else {
                missed += 1;
                continue;
            };

            let on_surface = self.triangles[tri_index].project(p, normal);
            let frame = Frame::from_normal(on_surface, normal, self.basis);
            let placement = randomize(frame, Some(normal), self.basis, self.params, self.footprints.len(), rng);

            let footprint = self.footprints.get(placement.source_index).copied().unwrap_or(reference);
            history.push(PlacedPoint::new(on_surface, Some(footprint * placement.scale.abs().max_element())));
            out.placements.push(placement);
        }

        debug!(
            "rejection pass: {}/{} accepted in {} attempts ({} collided, {} off-surface)",
            out.created(),
            self.requested,
            out.attempts,
            collided,
            missed
        );
        out
    }
}

/// Shared argument validation for the surface-based samplers.
pub(crate) fn require_sources(footprints: &[f32]) -> Result<(), ScatterError> {
    if footprints.is_empty() {
        return Err(ScatterError::NoSources);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_hit_skips_degenerate_and_respects_scan_order() {
        let degenerate = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        let big = Triangle::new(Vec3::new(-10.0, -10.0, 0.0), Vec3::new(10.0, -10.0, 0.0), Vec3::new(0.0, 10.0, 0.0));
        let raised = Triangle::new(Vec3::new(-10.0, -10.0, 5.0), Vec3::new(10.0, -10.0, 5.0), Vec3::new(0.0, 10.0, 5.0));
        let tris = [degenerate, big, raised];
        let (i, n) = first_containing(&tris, Vec3::new(0.0, 0.0, 3.0)).unwrap();
        assert_eq!(i, 1);
        assert!((n - Vec3::Z).length() < 1e-6);
        assert!(first_containing(&tris, Vec3::new(50.0, 0.0, 0.0)).is_none());
        assert!(first_containing(&[degenerate], Vec3::ZERO).is_none());
    }

    #[test]
    fn reference_extent_takes_largest_finite() {
        assert_eq!(reference_extent(&[1.0, 4.0, f32::NAN, 2.0]), 4.0);
        assert_eq!(reference_extent(&[]), 0.0);
    }

    #[test]
    fn large_requests_reserve_a_bounded_buffer() {
        use rand::SeedableRng;
        let params = ScatterParameters::default();
        let pass = RejectionPass {
            triangles: &[],
            requested: 100 * RESERVE_LIMIT,
            params: &params,
            footprints: &[1.0],
            basis: FrameBasis::Surface,
        };
        let mut history = Vec::new();
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        let mut draws = 0;
        // no triangles, so every candidate misses
        let out = pass.run(&mut history, &mut rng, |_| {
            draws += 1;
            Vec3::ZERO
        });
        assert_eq!(out.created(), 0);
        assert!(out.placements.capacity() <= RESERVE_LIMIT);
        assert_eq!(draws, out.attempts);
        assert_eq!(out.attempts, 100 * RESERVE_LIMIT * ATTEMPTS_PER_PLACEMENT);
    }
}
