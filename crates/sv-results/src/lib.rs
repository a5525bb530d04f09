//! sv-results: typed result objects over raw engine payloads.
//!
//! Each wrapper is built from exactly one payload shape, validates it at
//! construction time and is immutable afterwards, apart from the profiler
//! reading slot filled in once the producing call has been measured.

pub mod fpt;
pub mod measure;
pub mod profile;
pub mod reachability;
pub mod synthesis;
pub mod trace;

pub use fpt::{
    FirstPassageTimePayload, FirstPassageTimeResult, FirstPassageTimeSource,
    FirstPassageTimeSummary,
};
pub use measure::{MeasureKey, MeasureKind, MeasureSeries, Sample};
pub use profile::{Profiled, ProfilerReading};
pub use reachability::{ReachabilityQuery, ReachabilityResult};
pub use synthesis::{
    Constraint, Evaluator, FitMetrics, Interval, ParamMap, SearchSpace, SynthesisPayload,
    SynthesisRecord,
};
pub use trace::{SimulationTraceResult, TracePayload};

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("Measure key is empty")]
    EmptyKey,

    #[error("Measure key '{key}' must start with '#' or '%'")]
    MissingSigil { key: String },

    #[error("Duplicate measure key: {key}")]
    DuplicateMeasure { key: String },

    #[error("Measure '{key}' row {row} has {len} values, expected 4 (time, mean, sd, ci)")]
    RowArity { key: String, row: usize, len: usize },

    #[error("Measure '{key}' row {row}: {source}")]
    InvalidValue {
        key: String,
        row: usize,
        source: sv_core::SvError,
    },

    #[error("Measure '{key}' row {row}: sd and ci must be non-negative")]
    NegativeSpread { key: String, row: usize },

    #[error("Measure '{key}' row {row}: time goes backwards")]
    NonMonotonicTime { key: String, row: usize },

    #[error("Measure '{key}' is not a sequence of numeric rows: {message}")]
    InvalidSeries { key: String, message: String },

    #[error("Trace payload must be a mapping from measure key to rows")]
    NotAMapping,

    #[error("Probability must lie in [0, 1], got {value}")]
    InvalidProbability { value: f64 },

    #[error("Invalid bounds for dimension '{dimension}': [{lower}, {upper}]")]
    InvalidBounds {
        dimension: String,
        lower: f64,
        upper: f64,
    },

    #[error("Duplicate search-space dimension: {dimension}")]
    DuplicateDimension { dimension: String },

    #[error("Dimension mismatch in {what}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Training portion must lie in (0, 1], got {value}")]
    InvalidTrainingPortion { value: f64 },

    #[error("Surrogate-assisted record is missing its surrogate function")]
    MissingSurrogate,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
