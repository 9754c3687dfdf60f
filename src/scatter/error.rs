// src/scatter/error.rs

/// Configuration errors. Reported before any placement work happens.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScatterError {
    #[error("no scatter target set")]
    NoTarget,
    #[error("scatter target {0} could not be resolved by the host")]
    TargetUnavailable(u64),
    #[error("degenerate curve (arc length {length})")]
    DegenerateCurve { length: f32 },
    #[error("no source objects available")]
    NoSources,
    #[error("{requested} instances requested, limit is {limit}")]
    TooManyInstances { requested: u64, limit: usize },
    #[error("neither a placement count nor a spacing was supplied")]
    MissingDistribution,
    #[error("painting requires a surface target")]
    NotASurface,
    #[error("invalid property '{key}': {reason}")]
    InvalidProperty { key: String, reason: String },
    #[error("RON error: {0}")]
    Ron(String),
}
