// src/scatter/placement/curve.rs
//! Parametric sampling along a curve with tangent-aligned frames.

use bevy::log::{debug, warn};
use rand::Rng;

use super::randomize;
use crate::scatter::core::{CurveQuery, Frame, FrameBasis, PlacementResult, PARALLEL_LIMIT, WORLD_UP};
use crate::scatter::error::ScatterError;
use crate::scatter::params::{Distribution, ScatterParameters};

/// Upper bound on instances a single curve pass may create.
pub const MAX_CURVE_INSTANCES: usize = 1 << 20;

/// Instance count for a curve pass. `Ok(None)` means "nothing to do" (spacing unset or
/// non-positive); an explicit count is used as-is. Counts above `MAX_CURVE_INSTANCES`
/// are rejected.
pub fn curve_instance_count(arc_length: f32, distribution: Distribution) -> Result<Option<usize>, ScatterError> {
    let requested = match distribution {
        Distribution::Count(n) => n as u64,
        Distribution::Spacing(d) if d > 0.0 && d.is_finite() => {
            let steps = (arc_length as f64 / d as f64).floor();
            if steps >= MAX_CURVE_INSTANCES as f64 {
                return Err(ScatterError::TooManyInstances {
                    requested: (steps + 1.0).min(u64::MAX as f64) as u64,
                    limit: MAX_CURVE_INSTANCES,
                });
            }
            steps as u64 + 1
        }
        Distribution::Spacing(_) => return Ok(None),
    };
    if requested > MAX_CURVE_INSTANCES as u64 {
        return Err(ScatterError::TooManyInstances { requested, limit: MAX_CURVE_INSTANCES });
    }
    Ok(Some(requested as usize))
}

/// Samples `instance_count` frames along `curve`. Closed curves divide by the count so
/// the last sample stops one step short of the start; open curves divide by
/// `count - 1` so the last sample lands on the end point (a single sample sits at 0).
///
/// Each frame gets per-axis jitter in its local axes, a rotation/scale draw and an
/// independent source pick in `0..source_count`.
pub fn sample_along_curve<R: Rng + ?Sized>(
    curve: &dyn CurveQuery,
    params: &ScatterParameters,
    source_count: usize,
    rng: &mut R,
) -> Result<Vec<PlacementResult>, ScatterError> {
    if source_count == 0 {
        return Err(ScatterError::NoSources);
    }
    let length = curve.arc_length();
    if !(length > 0.0) || !length.is_finite() {
        return Err(ScatterError::DegenerateCurve { length });
    }

    let Some(count) = curve_instance_count(length, params.distribution)? else {
        debug!("curve pass skipped: spacing unset ({:?})", params.distribution);
        return Ok(Vec::new());
    };

    let closed = curve.is_closed();
    let divisor = if closed { count } else { count.saturating_sub(1) };
    debug!("curve pass: {count} instances over length {length:.3} (closed={closed}, divisor={divisor})");

    let mut out = Vec::with_capacity(count);
    let mut vertical = 0usize;
    for i in 0..count {
        let t = if divisor == 0 { 0.0 } else { i as f32 / divisor as f32 };
        let position = curve.position_at(t);
        let tangent = curve.tangent_at(t);
        if tangent.normalize_or_zero().dot(WORLD_UP).abs() > PARALLEL_LIMIT {
            vertical += 1;
        }

        let mut frame = Frame::along_tangent(position, tangent);
        frame.origin = frame.local_to_world(params.sample_jitter(rng));

        out.push(randomize(frame, None, FrameBasis::Surface, params, source_count, rng));
    }
    if vertical > 0 {
        warn!("curve pass: {vertical} near-vertical tangents, up axis fell back to world Y");
    }
    Ok(out)
}
