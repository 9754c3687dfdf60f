// src/scatter/core.rs
//! Core types/traits for scatter placement: frames, triangles, bounds, the curve
//! collaborator and the per-placement result.
//! Keep this file dependency-light; every sampler builds on it.

use bevy::math::{EulerRot, Mat3, Quat, Vec3};

use super::error::ScatterError;

/// World up axis (Z-up scene convention).
pub const WORLD_UP: Vec3 = Vec3::Z;

/// Tolerance for frame orthonormality checks.
pub const FRAME_TOLERANCE: f32 = 1e-5;

/// |dot| above which a reference axis counts as parallel and gets swapped.
pub const PARALLEL_LIMIT: f32 = 0.99;

// ---------- Handles ----------

/// Opaque host object reference. Compared by identity only; the engine never
/// dereferences it, the host resolves it through `ScatterHost`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

// ---------- Bounds ----------

/// Axis-aligned box. `min <= max` component-wise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Builds a box from two arbitrary corners.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    /// Tight box around a set of points; `None` when empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let (min, max) = it.fold((first, first), |(mn, mx), p| (mn.min(p), mx.max(p)));
        Some(Self { min, max })
    }

    pub fn from_triangles(triangles: &[Triangle]) -> Option<Self> {
        Self::from_points(triangles.iter().flat_map(|t| [t.a, t.b, t.c]))
    }

    #[inline]
    pub fn size(&self) -> Vec3 { self.max - self.min }

    /// Largest side length; the footprint estimate used for separation.
    #[inline]
    pub fn max_extent(&self) -> f32 { self.size().max_element() }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

// ---------- Triangles ----------

/// A triangle whose normal is undefined (zero area or non-finite vertices).
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
#[error("degenerate triangle (no defined normal)")]
pub struct DegenerateTriangle;

/// Three vertices, counter-clockwise when seen from the normal side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub const fn new(a: Vec3, b: Vec3, c: Vec3) -> Self { Self { a, b, c } }

    /// Unit face normal.
    pub fn normal(&self) -> Result<Vec3, DegenerateTriangle> {
        (self.b - self.a)
            .cross(self.c - self.a)
            .try_normalize()
            .ok_or(DegenerateTriangle)
    }

    /// Same-side test: `p` is inside when it lies on the inner side of all three
    /// edges (signed cross product dotted with the face normal is >= 0). Points off
    /// the plane are classified by their projection along the normal.
    pub fn contains(&self, p: Vec3) -> Result<bool, DegenerateTriangle> {
        let n = self.normal()?;
        let edges = [(self.a, self.b), (self.b, self.c), (self.c, self.a)];
        Ok(edges
            .iter()
            .all(|&(from, to)| (to - from).cross(p - from).dot(n) >= 0.0))
    }

    /// Projects `p` onto the triangle's plane along `normal`.
    #[inline]
    pub fn project(&self, p: Vec3, normal: Vec3) -> Vec3 {
        p - normal * (p - self.a).dot(normal)
    }
}

// ---------- Frames ----------

/// Which reference axes build a frame from a surface normal. The reference is
/// swapped for the alternate when nearly parallel to the normal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameBasis {
    /// Surface sampler / orientation blender: world Z, falling back to world Y.
    #[default]
    Surface,
    /// Painter: world Y, falling back to world X.
    Brush,
}

impl FrameBasis {
    #[inline]
    pub fn axes(self) -> (Vec3, Vec3) {
        match self {
            FrameBasis::Surface => (WORLD_UP, Vec3::Y),
            FrameBasis::Brush => (Vec3::Y, Vec3::X),
        }
    }
}

/// Orthonormal placement frame plus origin.
///
/// Local axes: for curve frames `x` is the tangent (forward), `y` the right vector and
/// `z` the recomputed up. For surface frames `z` is the surface normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub origin: Vec3,
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl Frame {
    pub const IDENTITY: Self = Self { origin: Vec3::ZERO, x: Vec3::X, y: Vec3::Y, z: Vec3::Z };

    /// Curve frame: `right = cross(up, T)`, `up = cross(T, right)`. World up is
    /// swapped for world Y when the tangent is nearly vertical.
    pub fn along_tangent(origin: Vec3, tangent: Vec3) -> Self {
        let forward = tangent.normalize_or(Vec3::X);
        let reference = if forward.dot(WORLD_UP).abs() > PARALLEL_LIMIT { Vec3::Y } else { WORLD_UP };
        let right = reference.cross(forward).normalize();
        let up = forward.cross(right).normalize();
        Self { origin, x: forward, y: right, z: up }
    }

    /// Normal-aligned frame: `z = normal`, `x = cross(reference, z)`, `y = cross(z, x)`.
    pub fn from_normal(origin: Vec3, normal: Vec3, basis: FrameBasis) -> Self {
        let z = normal.normalize_or(WORLD_UP);
        let (reference, alternate) = basis.axes();
        let reference = if z.dot(reference).abs() > PARALLEL_LIMIT { alternate } else { reference };
        let x = reference.cross(z).normalize();
        let y = z.cross(x).normalize();
        Self { origin, x, y, z }
    }

    /// Offsets `local` along the frame axes.
    #[inline]
    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.origin + self.x * local.x + self.y * local.y + self.z * local.z
    }

    #[inline]
    pub fn basis(&self) -> Mat3 { Mat3::from_cols(self.x, self.y, self.z) }

    pub fn is_orthonormal(&self, tolerance: f32) -> bool {
        let unit = |v: Vec3| (v.length() - 1.0).abs() < tolerance;
        unit(self.x) && unit(self.y) && unit(self.z)
            && self.x.dot(self.y).abs() < tolerance
            && self.y.dot(self.z).abs() < tolerance
            && self.z.dot(self.x).abs() < tolerance
    }
}

// ---------- Placement I/O ----------

/// Final instance transform mirrored onto a host object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

/// One accepted placement, as produced by a sampler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementResult {
    pub frame: Frame,
    /// Local rotation jitter (radians, XYZ order) applied on top of the frame.
    pub rotation: Vec3,
    pub scale: Vec3,
    /// Surface normal at placement time (surface and painter modes only).
    pub normal: Option<Vec3>,
    /// Reference axes used to rebuild the frame from `normal`.
    pub basis: FrameBasis,
    /// Index into the pick list handed to the sampler.
    pub source_index: usize,
}

impl PlacementResult {
    pub fn transform(&self) -> InstanceTransform {
        let frame_rot = Quat::from_mat3(&self.frame.basis());
        let jitter = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        InstanceTransform {
            translation: self.frame.origin,
            rotation: (frame_rot * jitter).normalize(),
            scale: self.scale,
        }
    }
}

// ---------- Curve collaborator ----------

/// Host-side curve query. `t` is normalized to [0, 1].
pub trait CurveQuery {
    fn is_closed(&self) -> bool;
    fn arc_length(&self) -> f32;
    fn position_at(&self, t: f32) -> Vec3;
    /// Unit tangent at `t`.
    fn tangent_at(&self, t: f32) -> Vec3;
}

/// Arc-length parameterized polyline, open or closed.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    points: Vec<Vec3>,
    cumulative: Vec<f32>,
    closed: bool,
}

impl Polyline {
    pub fn new(points: impl IntoIterator<Item = Vec3>, closed: bool) -> Result<Self, ScatterError> {
        let mut pts: Vec<Vec3> = Vec::new();
        for p in points {
            if pts.last().is_none_or(|last: &Vec3| last.distance_squared(p) > f32::EPSILON) {
                pts.push(p);
            }
        }
        if closed && pts.len() > 2 && pts[0].distance_squared(pts[pts.len() - 1]) <= f32::EPSILON {
            pts.pop();
        }
        if pts.len() < 2 {
            return Err(ScatterError::DegenerateCurve { length: 0.0 });
        }

        let seg_count = if closed { pts.len() } else { pts.len() - 1 };
        let mut cumulative = Vec::with_capacity(seg_count + 1);
        cumulative.push(0.0);
        let mut total = 0.0;
        for i in 0..seg_count {
            total += pts[i].distance(pts[(i + 1) % pts.len()]);
            cumulative.push(total);
        }

        Ok(Self { points: pts, cumulative, closed })
    }

    pub fn points(&self) -> &[Vec3] { &self.points }

    #[inline]
    fn segment(&self, i: usize) -> (Vec3, Vec3) {
        (self.points[i], self.points[(i + 1) % self.points.len()])
    }

    /// Segment index and local ratio for normalized `t`.
    fn locate(&self, t: f32) -> (usize, f32) {
        let t = if self.closed { t.rem_euclid(1.0) } else { t.clamp(0.0, 1.0) };
        let total = self.arc_length();
        let target = t * total;
        let seg_count = self.cumulative.len() - 1;
        let idx = self
            .cumulative
            .partition_point(|&c| c <= target)
            .saturating_sub(1)
            .min(seg_count - 1);
        let seg_len = self.cumulative[idx + 1] - self.cumulative[idx];
        let ratio = if seg_len > 0.0 { ((target - self.cumulative[idx]) / seg_len).clamp(0.0, 1.0) } else { 0.0 };
        (idx, ratio)
    }
}

impl CurveQuery for Polyline {
    fn is_closed(&self) -> bool { self.closed }

    fn arc_length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    fn position_at(&self, t: f32) -> Vec3 {
        let (idx, ratio) = self.locate(t);
        let (a, b) = self.segment(idx);
        a.lerp(b, ratio)
    }

    fn tangent_at(&self, t: f32) -> Vec3 {
        let (idx, _) = self.locate(t);
        let (a, b) = self.segment(idx);
        (b - a).normalize_or_zero()
    }
}
