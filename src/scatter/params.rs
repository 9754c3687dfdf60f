// src/scatter/params.rs
//! Scatter parameters (data form) + RON / user-property persistence.

use std::collections::HashMap;

use bevy::math::Vec3;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::ScatterError;

// ---------- Building blocks ----------

/// How many instances a curve pass produces. Exactly one of the two is active.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Distribution {
    /// Fixed instance count.
    Count(u32),
    /// Target spacing along the curve (world units).
    Spacing(f32),
}

impl Distribution {
    /// Count for surface/painter passes; spacing has no meaning there.
    pub fn count(self) -> Option<u32> {
        match self {
            Distribution::Count(n) => Some(n),
            Distribution::Spacing(_) => None,
        }
    }
}

/// Inclusive `[min, max]` range sampled uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const ZERO: Self = Self { min: 0.0, max: 0.0 };
    pub const ONE: Self = Self { min: 1.0, max: 1.0 };

    pub const fn new(min: f32, max: f32) -> Self { Self { min, max } }

    /// Symmetric `[-half, half]`.
    pub fn symmetric(half: f32) -> Self { Self::new(-half.abs(), half.abs()) }

    /// Uniform draw; reversed bounds are tolerated, an empty span returns `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let (lo, hi) = if self.min <= self.max { (self.min, self.max) } else { (self.max, self.min) };
        let span = hi - lo;
        if !span.is_finite() || span <= f32::EPSILON {
            return lo;
        }
        rng.random_range(lo..=hi)
    }
}

/// Where surface candidates are drawn on Z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateZ {
    /// Pinned to the bounding box minimum.
    Planar,
    /// Uniform across the bounding box Z extent.
    #[default]
    Volumetric,
}

// ---------- Parameters ----------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterParameters {
    pub distribution: Distribution,

    /// Master switch for jitter, scale and rotation randomization.
    pub randomize: bool,

    /// Per-axis positional jitter in the placement frame (curve mode).
    pub position_jitter: [ValueRange; 3],

    /// Per-axis scale ranges. With `proportional_scale`, Y and Z mirror X.
    pub scale: [ValueRange; 3],
    pub proportional_scale: bool,

    /// Per-axis local rotation ranges (degrees).
    pub rotation_deg: [ValueRange; 3],

    pub collision: bool,
    /// Multiplier on the reference footprint for minimum separation.
    pub collision_factor: f32,

    /// Painter brush radius (world units).
    pub brush_radius: f32,
    /// Placements attempted per dab.
    pub brush_density: u32,

    /// Normal/world-axis blend in [-100, 100].
    pub orientation_blend: f32,

    /// Percentage of instances visible in the viewport, [0, 100].
    pub display_percent: f32,

    pub candidate_z: CandidateZ,

    pub seed: u64,
}

impl Default for ScatterParameters {
    fn default() -> Self {
        Self {
            distribution: Distribution::Count(10),
            randomize: true,
            position_jitter: [ValueRange::ZERO; 3],
            scale: [ValueRange::ONE; 3],
            proportional_scale: true,
            rotation_deg: [ValueRange::ZERO; 3],
            collision: false,
            collision_factor: 1.0,
            brush_radius: 10.0,
            brush_density: 5,
            orientation_blend: 0.0,
            display_percent: 100.0,
            candidate_z: CandidateZ::Volumetric,
            seed: 1337,
        }
    }
}

impl ScatterParameters {
    /// Scale ranges after applying the proportional flag.
    pub fn effective_scale(&self) -> [ValueRange; 3] {
        if self.proportional_scale {
            [self.scale[0]; 3]
        } else {
            self.scale
        }
    }

    pub fn sample_jitter<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        if !self.randomize {
            return Vec3::ZERO;
        }
        let [x, y, z] = self.position_jitter;
        Vec3::new(x.sample(rng), y.sample(rng), z.sample(rng))
    }

    /// Proportional scale draws once and applies it on all axes.
    pub fn sample_scale<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        if !self.randomize {
            return Vec3::ONE;
        }
        let [x, y, z] = self.effective_scale();
        if self.proportional_scale {
            return Vec3::splat(x.sample(rng));
        }
        Vec3::new(x.sample(rng), y.sample(rng), z.sample(rng))
    }

    /// Local rotation jitter in radians.
    pub fn sample_rotation<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        if !self.randomize {
            return Vec3::ZERO;
        }
        let [x, y, z] = self.rotation_deg;
        Vec3::new(x.sample(rng), y.sample(rng), z.sample(rng)) * (std::f32::consts::PI / 180.0)
    }

    /// Largest scale factor a placement can receive; used to size footprints.
    pub fn max_scale(&self) -> f32 {
        if !self.randomize {
            return 1.0;
        }
        self.effective_scale()
            .iter()
            .map(|r| r.min.abs().max(r.max.abs()))
            .fold(0.0, f32::max)
    }

    pub fn from_ron_str(s: &str) -> Result<Self, ScatterError> {
        ron::from_str(s).map_err(|e| ScatterError::Ron(e.to_string()))
    }

    pub fn to_ron_string(&self) -> Result<String, ScatterError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ScatterError::Ron(e.to_string()))
    }
}

// ---------- User-property persistence ----------

pub const KEY_COUNT: &str = "scatter.count";
pub const KEY_SPACING: &str = "scatter.spacing";
pub const KEY_RANDOMIZE: &str = "scatter.randomize";
pub const KEY_JITTER: [&str; 3] = ["scatter.jitter_x", "scatter.jitter_y", "scatter.jitter_z"];
pub const KEY_SCALE: [&str; 3] = ["scatter.scale_x", "scatter.scale_y", "scatter.scale_z"];
pub const KEY_PROPORTIONAL: &str = "scatter.proportional";
pub const KEY_ROTATION: [&str; 3] = ["scatter.rot_x", "scatter.rot_y", "scatter.rot_z"];
pub const KEY_COLLISION: &str = "scatter.collision";
pub const KEY_COLLISION_FACTOR: &str = "scatter.collision_factor";
pub const KEY_BRUSH_RADIUS: &str = "scatter.brush_radius";
pub const KEY_BRUSH_DENSITY: &str = "scatter.brush_density";
pub const KEY_ORIENTATION: &str = "scatter.orientation";
pub const KEY_DISPLAY: &str = "scatter.display";
pub const KEY_CANDIDATE_Z: &str = "scatter.candidate_z";
pub const KEY_SEED: &str = "scatter.seed";

fn encode<T: Serialize>(key: &str, value: &T) -> Result<(String, String), ScatterError> {
    let v = ron::to_string(value).map_err(|e| ScatterError::InvalidProperty {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok((key.to_string(), v))
}

fn decode<T: DeserializeOwned>(key: &str, value: &str) -> Result<T, ScatterError> {
    ron::from_str(value).map_err(|e| ScatterError::InvalidProperty {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Overwrites `slot` when `key` is present.
fn read_into<T: DeserializeOwned>(
    map: &HashMap<&str, &str>,
    key: &str,
    slot: &mut T,
) -> Result<(), ScatterError> {
    if let Some(v) = map.get(key) {
        *slot = decode(key, v)?;
    }
    Ok(())
}

impl ScatterParameters {
    /// Flattens the record into `(key, value)` string pairs for host object metadata.
    /// Values are RON literals.
    pub fn to_user_props(&self) -> Result<Vec<(String, String)>, ScatterError> {
        let mut out = Vec::with_capacity(20);
        match self.distribution {
            Distribution::Count(n) => out.push(encode(KEY_COUNT, &n)?),
            Distribution::Spacing(d) => out.push(encode(KEY_SPACING, &d)?),
        }
        out.push(encode(KEY_RANDOMIZE, &self.randomize)?);
        for (key, range) in KEY_JITTER.iter().zip(&self.position_jitter) {
            out.push(encode(key, range)?);
        }
        for (key, range) in KEY_SCALE.iter().zip(&self.scale) {
            out.push(encode(key, range)?);
        }
        out.push(encode(KEY_PROPORTIONAL, &self.proportional_scale)?);
        for (key, range) in KEY_ROTATION.iter().zip(&self.rotation_deg) {
            out.push(encode(key, range)?);
        }
        out.push(encode(KEY_COLLISION, &self.collision)?);
        out.push(encode(KEY_COLLISION_FACTOR, &self.collision_factor)?);
        out.push(encode(KEY_BRUSH_RADIUS, &self.brush_radius)?);
        out.push(encode(KEY_BRUSH_DENSITY, &self.brush_density)?);
        out.push(encode(KEY_ORIENTATION, &self.orientation_blend)?);
        out.push(encode(KEY_DISPLAY, &self.display_percent)?);
        out.push(encode(KEY_CANDIDATE_Z, &self.candidate_z)?);
        out.push(encode(KEY_SEED, &self.seed)?);
        Ok(out)
    }

    /// Rebuilds parameters from stored pairs. Unknown keys are ignored, missing keys
    /// keep their defaults; a count wins over a spacing when both are present.
    pub fn from_user_props<'a, I>(props: I) -> Result<Self, ScatterError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let map: HashMap<&str, &str> = props.into_iter().collect();
        let mut p = Self::default();

        p.distribution = match (map.get(KEY_COUNT), map.get(KEY_SPACING)) {
            (Some(v), _) => Distribution::Count(decode(KEY_COUNT, v)?),
            (None, Some(v)) => Distribution::Spacing(decode(KEY_SPACING, v)?),
            (None, None) => return Err(ScatterError::MissingDistribution),
        };

        read_into(&map, KEY_RANDOMIZE, &mut p.randomize)?;
        for (key, slot) in KEY_JITTER.iter().zip(p.position_jitter.iter_mut()) {
            read_into(&map, key, slot)?;
        }
        for (key, slot) in KEY_SCALE.iter().zip(p.scale.iter_mut()) {
            read_into(&map, key, slot)?;
        }
        read_into(&map, KEY_PROPORTIONAL, &mut p.proportional_scale)?;
        for (key, slot) in KEY_ROTATION.iter().zip(p.rotation_deg.iter_mut()) {
            read_into(&map, key, slot)?;
        }
        read_into(&map, KEY_COLLISION, &mut p.collision)?;
        read_into(&map, KEY_COLLISION_FACTOR, &mut p.collision_factor)?;
        read_into(&map, KEY_BRUSH_RADIUS, &mut p.brush_radius)?;
        read_into(&map, KEY_BRUSH_DENSITY, &mut p.brush_density)?;
        read_into(&map, KEY_ORIENTATION, &mut p.orientation_blend)?;
        read_into(&map, KEY_DISPLAY, &mut p.display_percent)?;
        read_into(&map, KEY_CANDIDATE_Z, &mut p.candidate_z)?;
        read_into(&map, KEY_SEED, &mut p.seed)?;
        Ok(p)
    }
}
