// src/scatter/group.rs
//! Scatter group: parameters, source picks and placed instances for one scatter
//! operation, plus the host interface it drives.
//!
//! Curve/surface passes always clear and rebuild the whole instance list; painter dabs
//! append to it. All host state is reached through `ScatterHost` via integer handles.

use bevy::log::{info, warn};
use bevy::math::Vec3;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::collision::PlacedPoint;
use super::core::{Bounds, CurveQuery, InstanceTransform, ObjectHandle, PlacementResult, Triangle};
use super::error::ScatterError;
use super::orient::reorient_by_blend;
use super::params::ScatterParameters;
use super::placement::{pick_source, sample_along_curve, sample_brush_dab, sample_on_surface, Brush, SampleOutcome};
use super::sources::SourceSet;

// ---------- Host interface ----------

/// Object properties normalized once by the host integration layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjectCaps {
    pub can_display_as_box: bool,
}

/// Narrow query/command interface over the host scene.
pub trait ScatterHost {
    /// Curve geometry for a curve target.
    fn curve(&self, target: ObjectHandle) -> Option<Box<dyn CurveQuery + '_>>;
    /// Triangle soup (world space) for a surface target.
    fn triangles(&self, target: ObjectHandle) -> Option<Vec<Triangle>>;
    /// World-space bounding box.
    fn bounds(&self, obj: ObjectHandle) -> Option<Bounds>;
    fn is_alive(&self, obj: ObjectHandle) -> bool;

    /// Creates an instance of `source`; `None` when the host refuses.
    fn instantiate(&mut self, source: ObjectHandle, transform: &InstanceTransform) -> Option<ObjectHandle>;
    fn destroy(&mut self, obj: ObjectHandle);

    fn transform(&self, obj: ObjectHandle) -> Option<InstanceTransform>;
    fn set_transform(&mut self, obj: ObjectHandle, transform: &InstanceTransform);

    fn set_hidden(&mut self, obj: ObjectHandle, hidden: bool);
    fn set_frozen(&mut self, obj: ObjectHandle, frozen: bool);

    fn capabilities(&self, _obj: ObjectHandle) -> ObjectCaps { ObjectCaps::default() }
    fn set_display_as_box(&mut self, _obj: ObjectHandle, _as_box: bool) {}
}

// ---------- Group state ----------

/// What the group scatters onto. One or the other, never both.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScatterTarget {
    Curve(ObjectHandle),
    Surface(ObjectHandle),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScatterMode {
    Curve,
    Surface,
    Painter,
}

/// A placed host object plus the placement it came from. `transform` mirrors the host
/// object and goes stale if the object is moved externally until `sync_transforms`.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedInstance {
    pub handle: ObjectHandle,
    pub source: ObjectHandle,
    pub placement: PlacementResult,
    pub transform: InstanceTransform,
    pub hidden: bool,
}

impl PlacedInstance {
    #[inline]
    pub fn normal(&self) -> Option<Vec3> { self.placement.normal }
}

/// Summary of one rebuild or dab.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RebuildReport {
    pub mode: ScatterMode,
    pub requested: usize,
    pub created: usize,
    /// Candidate attempts spent (equal to `requested` for curve passes).
    pub attempts: usize,
}

impl RebuildReport {
    /// Fewer instances than requested ("surface too small").
    #[inline]
    pub fn is_partial(&self) -> bool { self.created < self.requested }
}

/// Resolved pick list: live source handles and their footprints, index-aligned.
struct Picks {
    handles: Vec<ObjectHandle>,
    footprints: Vec<f32>,
}

pub struct ScatterGroup {
    name: String,
    target: Option<ScatterTarget>,
    params: ScatterParameters,
    sources: SourceSet,
    fallback_source: Option<ObjectHandle>,
    instances: Vec<PlacedInstance>,
    rng: ChaCha8Rng,
    frozen: bool,
    display_as_box: bool,
}

impl ScatterGroup {
    pub fn new(name: impl Into<String>) -> Self {
        let params = ScatterParameters::default();
        Self {
            name: name.into(),
            target: None,
            rng: ChaCha8Rng::seed_from_u64(params.seed),
            params,
            sources: SourceSet::new(),
            fallback_source: None,
            instances: Vec::new(),
            frozen: false,
            display_as_box: false,
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn target(&self) -> Option<ScatterTarget> { self.target }
    pub fn params(&self) -> &ScatterParameters { &self.params }
    pub fn sources(&self) -> &SourceSet { &self.sources }
    pub fn sources_mut(&mut self) -> &mut SourceSet { &mut self.sources }
    pub fn instances(&self) -> &[PlacedInstance] { &self.instances }
    pub fn is_frozen(&self) -> bool { self.frozen }
    pub fn displays_as_box(&self) -> bool { self.display_as_box }

    pub fn set_curve_target(&mut self, curve: ObjectHandle) { self.target = Some(ScatterTarget::Curve(curve)); }
    pub fn set_surface_target(&mut self, surface: ObjectHandle) { self.target = Some(ScatterTarget::Surface(surface)); }
    pub fn clear_target(&mut self) { self.target = None; }

    /// Source used when the pick list is empty.
    pub fn set_fallback_source(&mut self, source: Option<ObjectHandle>) { self.fallback_source = source; }

    /// Replaces the parameters wholesale. Takes effect on the next rebuild.
    pub fn set_params(&mut self, params: ScatterParameters) { self.params = params; }

    // ---------- Placement passes ----------

    /// Clear-and-rebuild for the curve or surface target. Configuration errors leave
    /// the current instances untouched.
    pub fn rebuild(&mut self, host: &mut dyn ScatterHost) -> Result<RebuildReport, ScatterError> {
        self.prune_stale(host);
        let target = self.target.ok_or(ScatterError::NoTarget)?;
        let picks = self.resolve_picks(&*host)?;
        self.rng = ChaCha8Rng::seed_from_u64(self.params.seed);

        let (mode, outcome) = match target {
            ScatterTarget::Curve(h) => {
                let curve = host.curve(h).ok_or(ScatterError::TargetUnavailable(h.0))?;
                let placements = sample_along_curve(curve.as_ref(), &self.params, picks.handles.len(), &mut self.rng)?;
                let n = placements.len();
                (ScatterMode::Curve, SampleOutcome { placements, requested: n, attempts: n })
            }
            ScatterTarget::Surface(h) => {
                let count = self.params.distribution.count().ok_or(ScatterError::MissingDistribution)?;
                let triangles = host.triangles(h).ok_or(ScatterError::TargetUnavailable(h.0))?;
                let bounds = host
                    .bounds(h)
                    .or_else(|| Bounds::from_triangles(&triangles))
                    .ok_or(ScatterError::TargetUnavailable(h.0))?;
                let outcome = sample_on_surface(
                    &triangles,
                    bounds,
                    count as usize,
                    &self.params,
                    &picks.footprints,
                    &mut self.rng,
                )?;
                (ScatterMode::Surface, outcome)
            }
        };

        self.clear(host);
        let report = self.materialize(host, mode, outcome, &picks);
        self.apply_display_fraction(host, self.params.display_percent);

        info!(
            "scatter '{}': {:?} rebuild placed {}/{} ({} attempts)",
            self.name, report.mode, report.created, report.requested, report.attempts
        );
        Ok(report)
    }

    /// One painter dab on the surface target. Appends to the existing instances.
    pub fn paint(
        &mut self,
        host: &mut dyn ScatterHost,
        center: Vec3,
        brush_normal: Option<Vec3>,
    ) -> Result<RebuildReport, ScatterError> {
        self.prune_stale(host);
        let surface = match self.target {
            Some(ScatterTarget::Surface(h)) => h,
            Some(ScatterTarget::Curve(_)) => return Err(ScatterError::NotASurface),
            None => return Err(ScatterError::NoTarget),
        };
        let picks = self.resolve_picks(&*host)?;
        let triangles = host.triangles(surface).ok_or(ScatterError::TargetUnavailable(surface.0))?;

        let mut brush = Brush::new(center, self.params.brush_radius);
        if let Some(n) = brush_normal {
            brush = brush.with_normal(n);
        }
        let history = self.history(&*host);
        let outcome = sample_brush_dab(
            &triangles,
            &brush,
            self.params.brush_density as usize,
            &self.params,
            &picks.footprints,
            &history,
            &mut self.rng,
        )?;

        let first_new = self.instances.len();
        let report = self.materialize(host, ScatterMode::Painter, outcome, &picks);

        let keep = (display_percent(self.params.display_percent) / 100.0) as f64;
        for inst in &mut self.instances[first_new..] {
            if !self.rng.random_bool(keep) {
                inst.hidden = true;
                host.set_hidden(inst.handle, true);
            }
        }

        info!(
            "scatter '{}': dab at {:?} placed {}/{} (total {})",
            self.name,
            center,
            report.created,
            report.requested,
            self.instances.len()
        );
        Ok(report)
    }

    /// Destroys every placed instance.
    pub fn clear(&mut self, host: &mut dyn ScatterHost) {
        for inst in self.instances.drain(..) {
            if host.is_alive(inst.handle) {
                host.destroy(inst.handle);
            }
        }
    }

    // ---------- Bookkeeping ----------

    /// Re-picks a source for every instance without moving it. Returns how many
    /// instances changed source.
    pub fn shuffle_sources(&mut self, host: &mut dyn ScatterHost) -> Result<usize, ScatterError> {
        self.prune_stale(host);
        let picks = self.resolve_picks(&*host)?;
        let mut changed = 0;

        for inst in &mut self.instances {
            let idx = pick_source(&mut self.rng, picks.handles.len());
            let source = picks.handles[idx];
            if source == inst.source {
                inst.placement.source_index = idx;
                continue;
            }
            let Some(handle) = host.instantiate(source, &inst.transform) else {
                warn!("scatter '{}': host refused to instance {:?}", self.name, source);
                continue;
            };
            host.destroy(inst.handle);
            inst.handle = handle;
            inst.source = source;
            inst.placement.source_index = idx;
            Self::apply_state(host, inst, self.frozen, self.display_as_box);
            changed += 1;
        }
        Ok(changed)
    }

    /// Shows a random `percent` of the instances and hides the rest.
    pub fn apply_display_fraction(&mut self, host: &mut dyn ScatterHost, percent: f32) {
        let percent = display_percent(percent);
        self.params.display_percent = percent;

        let n = self.instances.len();
        let shown = ((n as f32) * percent / 100.0).round() as usize;
        let mut visible = vec![false; n];
        for i in index::sample(&mut self.rng, n, shown.min(n)) {
            visible[i] = true;
        }
        for (inst, vis) in self.instances.iter_mut().zip(visible) {
            inst.hidden = !vis;
            host.set_hidden(inst.handle, inst.hidden);
        }
    }

    /// Marks instances non-editable in the host.
    pub fn set_frozen(&mut self, host: &mut dyn ScatterHost, frozen: bool) {
        self.frozen = frozen;
        for inst in &self.instances {
            host.set_frozen(inst.handle, frozen);
        }
    }

    /// Box display for instances whose host object supports it.
    pub fn set_display_as_box(&mut self, host: &mut dyn ScatterHost, as_box: bool) {
        self.display_as_box = as_box;
        for inst in &self.instances {
            if host.capabilities(inst.handle).can_display_as_box {
                host.set_display_as_box(inst.handle, as_box);
            }
        }
    }

    /// Blends every surface-placed instance between its captured normal and the world
    /// axis and pushes the new rotations to the host. Curve instances keep their tangent
    /// frames. Positions and scales stay as they are.
    pub fn reorient(&mut self, host: &mut dyn ScatterHost, slider: f32) {
        self.prune_stale(host);
        self.params.orientation_blend = slider.clamp(-100.0, 100.0);

        let mut placements: Vec<PlacementResult> = self
            .instances
            .iter()
            .filter(|inst| inst.placement.normal.is_some())
            .map(|inst| {
                let mut p = inst.placement;
                p.frame.origin = inst.transform.translation;
                p
            })
            .collect();
        reorient_by_blend(&mut placements, self.params.orientation_blend);

        let blended = self.instances.iter_mut().filter(|inst| inst.placement.normal.is_some());
        for (inst, p) in blended.zip(placements) {
            inst.placement = p;
            inst.transform.rotation = p.transform().rotation;
            host.set_transform(inst.handle, &inst.transform);
        }
    }

    /// Pulls current transforms back from the host after external edits.
    pub fn sync_transforms(&mut self, host: &dyn ScatterHost) -> usize {
        self.prune_stale(host);
        let mut updated = 0;
        for inst in &mut self.instances {
            if let Some(t) = host.transform(inst.handle) {
                if t != inst.transform {
                    inst.transform = t;
                    inst.placement.frame.origin = t.translation;
                    updated += 1;
                }
            }
        }
        updated
    }

    /// Drops instances (and sources) whose host objects no longer exist.
    pub fn prune_stale(&mut self, host: &dyn ScatterHost) -> usize {
        let before = self.instances.len();
        self.instances.retain(|inst| host.is_alive(inst.handle));
        let dropped = before - self.instances.len();
        let dropped_sources = self.sources.retain(|s| host.is_alive(s));
        if dropped > 0 || dropped_sources > 0 {
            warn!(
                "scatter '{}': pruned {} stale instances, {} stale sources",
                self.name, dropped, dropped_sources
            );
        }
        dropped
    }

    // ---------- Internals ----------

    fn resolve_picks(&self, host: &dyn ScatterHost) -> Result<Picks, ScatterError> {
        let mut handles: Vec<ObjectHandle> = self.sources.iter().filter(|&s| host.is_alive(s)).collect();
        if handles.is_empty() {
            match self.fallback_source {
                Some(s) if host.is_alive(s) => handles.push(s),
                _ => return Err(ScatterError::NoSources),
            }
        }
        let footprints = handles
            .iter()
            .map(|&h| host.bounds(h).map(|b| b.max_extent()).unwrap_or(0.0))
            .collect();
        Ok(Picks { handles, footprints })
    }

    /// Collision history for dabs: every current instance with its scaled footprint.
    fn history(&self, host: &dyn ScatterHost) -> Vec<PlacedPoint> {
        self.instances
            .iter()
            .map(|inst| {
                let extent = host
                    .bounds(inst.source)
                    .map(|b| b.max_extent() * inst.transform.scale.abs().max_element());
                PlacedPoint::new(inst.transform.translation, extent)
            })
            .collect()
    }

    fn materialize(
        &mut self,
        host: &mut dyn ScatterHost,
        mode: ScatterMode,
        mut outcome: SampleOutcome,
        picks: &Picks,
    ) -> RebuildReport {
        if mode != ScatterMode::Curve && self.params.orientation_blend != 0.0 {
            reorient_by_blend(&mut outcome.placements, self.params.orientation_blend);
        }

        let mut created = 0;
        for placement in outcome.placements {
            let source = picks.handles[placement.source_index];
            let transform = placement.transform();
            let Some(handle) = host.instantiate(source, &transform) else {
                warn!("scatter '{}': host refused to instance {:?}", self.name, source);
                continue;
            };
            let inst = PlacedInstance { handle, source, placement, transform, hidden: false };
            Self::apply_state(host, &inst, self.frozen, self.display_as_box);
            self.instances.push(inst);
            created += 1;
        }

        RebuildReport { mode, requested: outcome.requested, created, attempts: outcome.attempts }
    }

    fn apply_state(host: &mut dyn ScatterHost, inst: &PlacedInstance, frozen: bool, as_box: bool) {
        if inst.hidden {
            host.set_hidden(inst.handle, true);
        }
        if frozen {
            host.set_frozen(inst.handle, true);
        }
        if as_box && host.capabilities(inst.handle).can_display_as_box {
            host.set_display_as_box(inst.handle, true);
        }
    }
}

/// Display percentage clamped to [0, 100]; non-finite values show everything.
#[inline]
fn display_percent(percent: f32) -> f32 {
    if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 100.0 }
}
