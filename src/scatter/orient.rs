// src/scatter/orient.rs
//! Orientation blender: tilts placements between their captured surface normal and
//! the world axis.

use bevy::math::Vec3;

use super::core::{Frame, PlacementResult, WORLD_UP};

/// Rebuilds every frame from `lerp(normal, ±WORLD_UP, |s|)` where `s = slider / 100`
/// clamped to [-1, 1]. Positions, scale and rotation jitter are untouched. The stored
/// normal is kept, so repeated calls do not compound.
pub fn reorient_by_blend(placements: &mut [PlacementResult], slider: f32) {
    let s = if slider.is_finite() { slider.clamp(-100.0, 100.0) / 100.0 } else { 0.0 };
    let target = if s >= 0.0 { WORLD_UP } else { -WORLD_UP };
    let weight = s.abs();

    for p in placements.iter_mut() {
        let base = p.normal.unwrap_or(WORLD_UP).normalize_or(WORLD_UP);
        let blended = blend_normal(base, target, weight);
        p.frame = Frame::from_normal(p.frame.origin, blended, p.basis);
    }
}

#[inline]
fn blend_normal(base: Vec3, target: Vec3, weight: f32) -> Vec3 {
    if weight >= 1.0 {
        return target;
    }
    // base and target can cancel out (normal pointing straight away at 50%)
    base.lerp(target, weight).normalize_or(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scatter::core::FrameBasis;

    fn placement(normal: Option<Vec3>, basis: FrameBasis) -> PlacementResult {
        let n = normal.unwrap_or(WORLD_UP);
        PlacementResult {
            frame: Frame::from_normal(Vec3::new(4.0, -2.0, 1.0), n, basis),
            rotation: Vec3::new(0.1, 0.2, 0.3),
            scale: Vec3::splat(1.5),
            normal,
            basis,
            source_index: 0,
        }
    }

    fn sample_set() -> Vec<PlacementResult> {
        vec![
            placement(Some(Vec3::new(0.4, 0.1, 0.9).normalize()), FrameBasis::Surface),
            placement(Some(Vec3::new(-0.7, 0.0, 0.7).normalize()), FrameBasis::Brush),
            placement(Some(Vec3::Y), FrameBasis::Surface),
            placement(None, FrameBasis::Surface),
        ]
    }

    #[test]
    fn zero_blend_keeps_frames() {
        let before = sample_set();
        let mut after = before.clone();
        reorient_by_blend(&mut after, 0.0);
        for (a, b) in before.iter().zip(&after) {
            assert!((a.frame.x - b.frame.x).length() < 1e-5);
            assert!((a.frame.y - b.frame.y).length() < 1e-5);
            assert!((a.frame.z - b.frame.z).length() < 1e-5);
        }
    }

    #[test]
    fn full_blend_points_along_world_axis() {
        let mut up = sample_set();
        reorient_by_blend(&mut up, 100.0);
        let mut down = sample_set();
        reorient_by_blend(&mut down, -100.0);
        for p in &up {
            assert!((p.frame.z - Vec3::Z).length() < 1e-5);
            assert!(p.frame.is_orthonormal(1e-4));
        }
        for p in &down {
            assert!((p.frame.z + Vec3::Z).length() < 1e-5);
            assert!(p.frame.is_orthonormal(1e-4));
        }
    }

    #[test]
    fn slider_is_clamped_and_position_kept() {
        let mut a = sample_set();
        reorient_by_blend(&mut a, 250.0);
        assert!(a.iter().all(|p| (p.frame.z - Vec3::Z).length() < 1e-5));
        assert!(a.iter().all(|p| p.frame.origin == Vec3::new(4.0, -2.0, 1.0)));
        assert!(a.iter().all(|p| p.scale == Vec3::splat(1.5)));
    }

    #[test]
    fn partial_blend_moves_toward_up_and_does_not_compound() {
        let mut a = sample_set();
        let n0 = a[1].normal.unwrap();
        reorient_by_blend(&mut a, 50.0);
        let once = a[1].frame.z;
        assert!(once.dot(Vec3::Z) > n0.dot(Vec3::Z));
        reorient_by_blend(&mut a, 50.0);
        assert!((a[1].frame.z - once).length() < 1e-6);
    }

    #[test]
    fn opposite_normal_half_blend_falls_back_to_target() {
        let mut a = vec![placement(Some(-Vec3::Z), FrameBasis::Surface)];
        reorient_by_blend(&mut a, 50.0);
        assert!((a[0].frame.z - Vec3::Z).length() < 1e-5);
    }
}
