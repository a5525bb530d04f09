//! Profiled engine calls returning typed results.

use std::sync::Arc;

use sv_results::{
    FirstPassageTimeResult, ReachabilityQuery, ReachabilityResult, SimulationTraceResult,
    SynthesisRecord,
};

use crate::config::ProfilerSettings;
use crate::engine::{SimulationConfig, SimulationEngine, SynthesisRequest};
use crate::error::{AppResult, EngineError};
use crate::profiler::ProfilingHarness;
use crate::progress::ProgressSink;

type SinkFactory = Box<dyn Fn() -> Box<dyn ProgressSink> + Send + Sync>;

/// Front door to an engine. Each call gets its own harness, so the reading
/// attached to a result describes that call alone.
pub struct RuntimeClient {
    engine: Arc<dyn SimulationEngine>,
    profiler: ProfilerSettings,
    sink_factory: Option<SinkFactory>,
}

impl RuntimeClient {
    pub fn new(engine: Arc<dyn SimulationEngine>) -> Self {
        Self {
            engine,
            profiler: ProfilerSettings::default(),
            sink_factory: None,
        }
    }

    pub fn with_profiler(mut self, settings: ProfilerSettings) -> Self {
        self.profiler = settings;
        self
    }

    /// Routes progress output of every call to sinks built by `factory`.
    pub fn with_sink_factory<S, F>(mut self, factory: F) -> Self
    where
        S: ProgressSink + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.sink_factory = Some(Box::new(move || Box::new(factory()) as Box<dyn ProgressSink>));
        self
    }

    fn harness(&self, running: impl Into<String>, done: impl Into<String>) -> ProfilingHarness {
        let harness = ProfilingHarness::from_settings(&self.profiler, running, done);
        match &self.sink_factory {
            Some(factory) => harness.with_boxed_sink(factory()),
            None => harness,
        }
    }

    pub fn simulate(&self, config: &SimulationConfig, label: &str) -> AppResult<SimulationTraceResult> {
        config.validate()?;
        tracing::debug!(
            label,
            model = ?config.model,
            steps = config.steps(),
            replica = config.replica,
            "simulation requested"
        );
        let engine = Arc::clone(&self.engine);
        let config = config.clone();
        let call_label = label.to_string();
        let mut harness = self.harness(
            "Simulating",
            "The simulation has been successfully completed",
        );
        let trace = harness.execute("simulate", move || {
            let payload = engine.simulate(&config, &call_label)?;
            Ok::<_, EngineError>(SimulationTraceResult::from_payload(payload)?)
        })?;
        tracing::info!(label, measures = trace.len(), "simulation finished");
        Ok(trace)
    }

    pub fn first_passage_time(
        &self,
        config: &SimulationConfig,
        predicate: &str,
    ) -> AppResult<FirstPassageTimeResult> {
        config.validate()?;
        let engine = Arc::clone(&self.engine);
        let config = config.clone();
        let predicate = predicate.to_string();
        let mut harness = self.harness(
            "Evaluating fpt",
            "The fpt evaluation has been successfully completed",
        );
        let result = harness.execute("first_passage_time", move || {
            let payload = engine.first_passage_time(&config, &predicate)?;
            Ok::<_, EngineError>(FirstPassageTimeResult::from_source(&payload))
        })?;
        Ok(result)
    }

    pub fn reachability(
        &self,
        config: &SimulationConfig,
        query: &ReachabilityQuery,
    ) -> AppResult<ReachabilityResult> {
        config.validate()?;
        let engine = Arc::clone(&self.engine);
        let config = config.clone();
        let query = query.clone();
        let mut harness = self.harness(
            query.running_message(),
            "The reachability evaluation has been successfully completed",
        );
        let result = harness.execute("reachability", move || {
            let probability = engine.reachability(&config, &query)?;
            Ok::<_, EngineError>(ReachabilityResult::new(probability, query)?)
        })?;
        Ok(result)
    }

    pub fn synthesize(&self, request: &SynthesisRequest) -> AppResult<SynthesisRecord> {
        let engine = Arc::clone(&self.engine);
        let request = request.clone();
        let mut harness = self.harness(
            "Synthesizing",
            "The synthesis has been successfully completed",
        );
        let record = harness.execute("synthesize", move || {
            let payload = engine.synthesize(&request)?;
            Ok::<_, EngineError>(SynthesisRecord::from_payload(payload)?)
        })?;
        Ok(record)
    }
}
