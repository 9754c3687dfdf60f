// src/scatter/placement/surface.rs
//! Bounding-box rejection sampling over a triangle mesh.

use bevy::log::{debug, warn};
use bevy::math::Vec3;
use rand::Rng;

use super::{require_sources, RejectionPass, SampleOutcome, RESERVE_LIMIT};
use crate::scatter::core::{Bounds, FrameBasis, Triangle};
use crate::scatter::error::ScatterError;
use crate::scatter::params::{CandidateZ, ScatterParameters, ValueRange};

/// Uniform candidate inside `bounds`; Z follows the configured policy.
fn candidate_in<R: Rng + ?Sized>(bounds: &Bounds, policy: CandidateZ, rng: &mut R) -> Vec3 {
    let x = ValueRange::new(bounds.min.x, bounds.max.x).sample(rng);
    let y = ValueRange::new(bounds.min.y, bounds.max.y).sample(rng);
    let z = match policy {
        CandidateZ::Planar => bounds.min.z,
        CandidateZ::Volumetric => ValueRange::new(bounds.min.z, bounds.max.z).sample(rng),
    };
    Vec3::new(x, y, z)
}

/// Places up to `count` instances on `triangles`, drawing candidates in `bounds`.
///
/// `footprints` holds the bounding extent of each pickable source (index = source
/// index). At most `count * 10` candidates are drawn; coming up short is reported as a
/// partial outcome, never an error.
pub fn sample_on_surface<R: Rng + ?Sized>(
    triangles: &[Triangle],
    bounds: Bounds,
    count: usize,
    params: &ScatterParameters,
    footprints: &[f32],
    rng: &mut R,
) -> Result<SampleOutcome, ScatterError> {
    require_sources(footprints)?;
    debug!(
        "surface pass: {count} requested over {} triangles, candidate z {:?}",
        triangles.len(),
        params.candidate_z
    );

    let pass = RejectionPass { triangles, requested: count, params, footprints, basis: FrameBasis::Surface };
    let mut history = Vec::with_capacity(count.min(RESERVE_LIMIT));
    let policy = params.candidate_z;
    let outcome = pass.run(&mut history, rng, |rng| candidate_in(&bounds, policy, rng));

    if outcome.is_partial() {
        warn!(
            "surface too small: created {} of {} after {} attempts",
            outcome.created(),
            outcome.requested,
            outcome.attempts
        );
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scatter::placement::ATTEMPTS_PER_PLACEMENT;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Two triangles covering the square [0, size]^2 at height `z`.
    fn quad(size: f32, z: f32) -> Vec<Triangle> {
        let a = Vec3::new(0.0, 0.0, z);
        let b = Vec3::new(size, 0.0, z);
        let c = Vec3::new(size, size, z);
        let d = Vec3::new(0.0, size, z);
        vec![Triangle::new(a, b, c), Triangle::new(a, c, d)]
    }

    #[test]
    fn large_surface_reaches_count() {
        let tris = quad(1000.0, 0.0);
        let bounds = Bounds::from_triangles(&tris).unwrap();
        let params = ScatterParameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let out = sample_on_surface(&tris, bounds, 50, &params, &[1.0], &mut rng).unwrap();
        assert_eq!(out.created(), 50);
        assert!(!out.is_partial());
        assert_eq!(out.attempts, 50);
        for p in &out.placements {
            assert!(bounds.contains(p.frame.origin));
            assert!((p.normal.unwrap() - Vec3::Z).length() < 1e-6);
            assert!(p.frame.is_orthonormal(1e-4));
        }
    }

    #[test]
    fn tiny_surface_with_collision_is_partial() {
        let tris = quad(1.0, 0.0);
        let bounds = Bounds::from_triangles(&tris).unwrap();
        let params = ScatterParameters { collision: true, ..Default::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let out = sample_on_surface(&tris, bounds, 20, &params, &[5.0], &mut rng).unwrap();
        assert!(out.is_partial());
        assert_eq!(out.created(), 1);
        assert_eq!(out.attempts, 20 * ATTEMPTS_PER_PLACEMENT);
    }

    #[test]
    fn never_exceeds_count_or_attempt_budget() {
        // triangle covers half the box; some candidates miss
        let tris = vec![quad(10.0, 0.0)[0]];
        let bounds = Bounds::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 0.0));
        let params = ScatterParameters { collision: true, collision_factor: 0.3, ..Default::default() };
        for seed in 0..8 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let out = sample_on_surface(&tris, bounds, 15, &params, &[2.0, 1.0], &mut rng).unwrap();
            assert!(out.created() <= 15);
            assert!(out.attempts <= 15 * ATTEMPTS_PER_PLACEMENT);
            for (i, a) in out.placements.iter().enumerate() {
                for b in &out.placements[i + 1..] {
                    assert!(a.frame.origin.distance(b.frame.origin) >= 0.6 - 1e-4);
                }
            }
        }
    }

    #[test]
    fn planar_policy_pins_candidates_to_box_min() {
        // vertical wall: planar candidates only ever touch its bottom edge
        let wall = vec![Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 10.0),
        )];
        let bounds = Bounds::from_triangles(&wall).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let planar = ScatterParameters { candidate_z: CandidateZ::Planar, ..Default::default() };
        let out = sample_on_surface(&wall, bounds, 10, &planar, &[1.0], &mut rng).unwrap();
        assert!(out.placements.iter().all(|p| p.frame.origin.z.abs() < 1e-5));

        let volumetric = ScatterParameters::default();
        let out = sample_on_surface(&wall, bounds, 10, &volumetric, &[1.0], &mut rng).unwrap();
        assert!(out.placements.iter().any(|p| p.frame.origin.z > 0.5));
    }

    #[test]
    fn points_are_projected_onto_the_plane() {
        let tris = quad(10.0, 3.0);
        let bounds = Bounds::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(10.0, 10.0, 5.0));
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let out = sample_on_surface(&tris, bounds, 10, &ScatterParameters::default(), &[1.0], &mut rng).unwrap();
        assert_eq!(out.created(), 10);
        assert!(out.placements.iter().all(|p| (p.frame.origin.z - 3.0).abs() < 1e-4));
    }

    #[test]
    fn requires_a_source() {
        let tris = quad(10.0, 0.0);
        let bounds = Bounds::from_triangles(&tris).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = sample_on_surface(&tris, bounds, 3, &ScatterParameters::default(), &[], &mut rng).unwrap_err();
        assert_eq!(err, ScatterError::NoSources);
    }
}
