//! sv-app: profiled engine calls shared by the CLI and the viewer.
//!
//! Every engine call goes through a [`ProfilingHarness`]: the call runs on a
//! worker thread while the caller's thread animates progress and a sampler
//! thread tracks resident memory.

pub mod config;
pub mod engine;
pub mod error;
pub mod probe;
pub mod profiler;
pub mod progress;
pub mod replay;
pub mod runtime;

pub use config::{ProfilerSettings, SessionConfig};
pub use engine::{
    ModelConfiguration, SimulationConfig, SimulationEngine, StatisticsMode, SynthesisRequest,
};
pub use error::{AppError, AppResult, EngineError, EngineResult};
pub use profiler::{ProfileOutcome, ProfileReport, ProfilingHarness};
pub use progress::{
    AnimationStyle, ProgressAnimator, ProgressEvent, ProgressSink, RecordingSink, SilentSink,
    TerminalSink,
};
pub use replay::{ReplayEngine, ReplayScript};
pub use runtime::RuntimeClient;
