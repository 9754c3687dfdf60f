//! Procedural scatter placement: copies of a source object distributed along a curve,
//! over a triangle surface, or painted with a brush.

pub mod scatter;

pub use scatter::core::{
    Bounds, CurveQuery, DegenerateTriangle, Frame, InstanceTransform, ObjectHandle,
    PlacementResult, Polyline, Triangle, WORLD_UP,
};
pub use scatter::error::ScatterError;
pub use scatter::group::{
    ObjectCaps, PlacedInstance, RebuildReport, ScatterGroup, ScatterHost, ScatterMode, ScatterTarget,
};
pub use scatter::params::{CandidateZ, Distribution, ScatterParameters, ValueRange};
pub use scatter::placement::{
    sample_along_curve, sample_brush_dab, sample_on_surface, Brush, SampleOutcome,
};
pub use scatter::collision::{collides, PlacedPoint};
pub use scatter::orient::reorient_by_blend;
pub use scatter::sources::SourceSet;
