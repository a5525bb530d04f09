//! The engine boundary: call parameters and the payloads calls return.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sv_results::{FirstPassageTimePayload, Interval, ReachabilityQuery, SynthesisPayload, TracePayload};

use crate::error::{AppError, AppResult, EngineResult};

/// Named initial configuration of a model and its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfiguration {
    pub name: String,
    #[serde(default)]
    pub args: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsMode {
    #[default]
    Descriptive,
    Summary,
}

/// Everything an engine call needs to know about the run.
///
/// Passed by reference to each call; the client keeps no copy between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub module: String,
    pub model: Option<PathBuf>,
    pub configuration: Option<ModelConfiguration>,
    pub deadline: f64,
    pub dt: f64,
    pub replica: u32,
    pub seed: Option<u64>,
    /// Measures to record; empty records all of them.
    pub measures: Vec<String>,
    pub statistics: StatisticsMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            module: "population".to_string(),
            model: None,
            configuration: None,
            deadline: 100.0,
            dt: 1.0,
            replica: 100,
            seed: None,
            measures: Vec::new(),
            statistics: StatisticsMode::Descriptive,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> AppResult<()> {
        if !(self.deadline.is_finite() && self.deadline > 0.0) {
            return Err(AppError::Validation(format!(
                "deadline must be positive, got {}",
                self.deadline
            )));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(AppError::Validation(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if self.replica == 0 {
            return Err(AppError::Validation("replica must be at least 1".to_string()));
        }
        if self.module.trim().is_empty() {
            return Err(AppError::Validation("module must be named".to_string()));
        }
        Ok(())
    }

    pub fn with_deadline(mut self, deadline: f64) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_replica(mut self, replica: u32) -> Self {
        self.replica = replica;
        self
    }

    /// Number of sampling points between 0 and the deadline.
    pub fn steps(&self) -> usize {
        (self.deadline / self.dt).floor() as usize + 1
    }
}

/// Parameters of a surrogate-assisted optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub optimization_algorithm: String,
    pub surrogate_model: String,
    pub sampling_strategy: String,
    #[serde(default = "default_true")]
    pub minimization: bool,
    #[serde(default = "default_true")]
    pub use_surrogate: bool,
    pub number_of_samples: usize,
    #[serde(default = "default_training_portion")]
    pub training_portion: f64,
    pub search_space: Vec<Interval>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

fn default_training_portion() -> f64 {
    0.85
}

/// Calls a simulation engine can serve.
///
/// Failures come back as [`crate::EngineError`] values; implementations
/// must not print and swallow them.
pub trait SimulationEngine: Send + Sync {
    fn simulate(&self, config: &SimulationConfig, label: &str) -> EngineResult<TracePayload>;

    fn first_passage_time(
        &self,
        config: &SimulationConfig,
        predicate: &str,
    ) -> EngineResult<FirstPassageTimePayload>;

    /// Probability that `query.goal` is reached.
    fn reachability(&self, config: &SimulationConfig, query: &ReachabilityQuery) -> EngineResult<f64>;

    fn synthesize(&self, request: &SynthesisRequest) -> EngineResult<SynthesisPayload>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.steps(), 101);
    }

    #[test]
    fn rejects_non_positive_step() {
        assert!(SimulationConfig::default().with_dt(0.0).validate().is_err());
        assert!(SimulationConfig::default().with_deadline(-1.0).validate().is_err());
        assert!(SimulationConfig::default().with_replica(0).validate().is_err());
    }

    #[test]
    fn synthesis_request_defaults() {
        let req: SynthesisRequest = serde_json::from_str(
            r#"{"optimization_algorithm": "pso", "surrogate_model": "rf",
                "sampling_strategy": "lhs", "number_of_samples": 100,
                "search_space": [{"name": "x", "lower": 0, "upper": 1}]}"#,
        )
        .unwrap();
        assert!(req.minimization);
        assert_eq!(req.training_portion, 0.85);
    }
}
