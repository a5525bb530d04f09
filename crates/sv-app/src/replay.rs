//! File-backed engine serving recorded payloads.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sv_results::{
    FirstPassageTimePayload, ReachabilityQuery, SimulationTraceResult, SynthesisPayload,
    TracePayload,
};

use crate::engine::{SimulationConfig, SimulationEngine, SynthesisRequest};
use crate::error::{AppError, AppResult, EngineError, EngineResult};

/// Recorded engine answers.
///
/// `traces` is keyed by simulation label; a `"*"` entry answers any label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayScript {
    pub traces: BTreeMap<String, serde_json::Value>,
    pub first_passage_times: BTreeMap<String, FirstPassageTimePayload>,
    pub reachability: BTreeMap<String, f64>,
}

const ANY_LABEL: &str = "*";
const SCRIPT_FIELDS: [&str; 3] = ["traces", "first_passage_times", "reachability"];

/// A top-level object is a bare trace when any key carries a measure sigil
/// or none of its keys names a script section.
fn looks_like_trace(value: &serde_json::Value) -> bool {
    value.as_object().is_some_and(|m| {
        m.keys().any(|k| k.starts_with('#') || k.starts_with('%'))
            || !m.keys().any(|k| SCRIPT_FIELDS.contains(&k.as_str()))
    })
}

#[derive(Debug, Clone, Default)]
pub struct ReplayEngine {
    script: ReplayScript,
}

impl ReplayEngine {
    pub fn new(script: ReplayScript) -> Self {
        Self { script }
    }

    /// Reads a script file. A bare trace object (measure keys at the top
    /// level) is accepted and served for every label.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| AppError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        let script = if looks_like_trace(&value) {
            // malformed keys are reported here, not on the first call
            SimulationTraceResult::from_json_value(value.clone())?;
            let mut script = ReplayScript::default();
            script.traces.insert(ANY_LABEL.to_string(), value);
            script
        } else {
            serde_json::from_value(value)?
        };
        tracing::debug!(
            path = %path.display(),
            traces = script.traces.len(),
            "replay script loaded"
        );
        Ok(Self::new(script))
    }

    pub fn script(&self) -> &ReplayScript {
        &self.script
    }
}

impl SimulationEngine for ReplayEngine {
    fn simulate(&self, config: &SimulationConfig, label: &str) -> EngineResult<TracePayload> {
        let raw = self
            .script
            .traces
            .get(label)
            .or_else(|| self.script.traces.get(ANY_LABEL))
            .ok_or_else(|| EngineError::Unknown {
                what: "simulation label",
                name: label.to_string(),
            })?;
        let trace = SimulationTraceResult::from_json_value(raw.clone())?;
        let mut payload = trace.to_payload();
        if !config.measures.is_empty() {
            payload.retain(|(key, _)| config.measures.iter().any(|m| m == &key[1..]));
        }
        Ok(payload)
    }

    fn first_passage_time(
        &self,
        _config: &SimulationConfig,
        predicate: &str,
    ) -> EngineResult<FirstPassageTimePayload> {
        self.script
            .first_passage_times
            .get(predicate)
            .copied()
            .ok_or_else(|| EngineError::Unknown {
                what: "predicate",
                name: predicate.to_string(),
            })
    }

    fn reachability(&self, _config: &SimulationConfig, query: &ReachabilityQuery) -> EngineResult<f64> {
        self.script
            .reachability
            .get(&query.goal)
            .copied()
            .ok_or_else(|| EngineError::Unknown {
                what: "goal",
                name: query.goal.clone(),
            })
    }

    fn synthesize(&self, _request: &SynthesisRequest) -> EngineResult<SynthesisPayload> {
        Err(EngineError::Unsupported { call: "synthesize" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ReplayEngine {
        let script: ReplayScript = serde_json::from_str(
            r##"{
                "traces": {"run": {"#S": [[0, 90, 1, 2]], "#I": [[0, 10, 1, 2]], "%S": [[0, 0.9, 0, 0]]}},
                "first_passage_times": {"extinct": {"tests": 10, "hits": 3, "mean": 4.2}},
                "reachability": {"allInfected": 0.25}
            }"##,
        )
        .unwrap();
        ReplayEngine::new(script)
    }

    #[test]
    fn measure_filter_applies_to_both_kinds() {
        let config = SimulationConfig {
            measures: vec!["S".into()],
            ..Default::default()
        };
        let payload = engine().simulate(&config, "run").unwrap();
        let keys: Vec<&str> = payload.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["#S", "%S"]);
    }

    fn load(name: &str, body: &str) -> AppResult<ReplayEngine> {
        let path = std::env::temp_dir().join(format!("sv-replay-{name}-{}.json", std::process::id()));
        fs::write(&path, body).unwrap();
        let loaded = ReplayEngine::from_path(&path);
        fs::remove_file(&path).ok();
        loaded
    }

    #[test]
    fn bare_trace_with_unmarked_key_names_the_key() {
        let err = load("unmarked", r##"{"#A": [[0, 10, 1, 2]], "B": [[0, 1, 0, 0]]}"##).unwrap_err();
        assert!(
            matches!(&err, AppError::Results(msg) if msg.contains("'B' must start with")),
            "{err}"
        );
    }

    #[test]
    fn object_without_script_sections_is_read_as_trace() {
        let err = load("nosigil", r#"{"B": [[0, 1, 0, 0]]}"#).unwrap_err();
        assert!(matches!(err, AppError::Results(_)), "{err}");
    }

    #[test]
    fn script_with_stray_field_is_rejected() {
        let err = load("stray", r#"{"traces": {}, "trace": {}}"#).unwrap_err();
        assert!(matches!(err, AppError::Json(_)), "{err}");
    }

    #[test]
    fn bare_trace_answers_every_label() {
        let engine = load("bare", r##"{"#A": [[0, 10, 1, 2]], "%A": [[0, 1, 0, 0]]}"##).unwrap();
        let payload = engine.simulate(&SimulationConfig::default(), "anything").unwrap();
        assert_eq!(payload.len(), 2);
    }

    #[test]
    fn unknown_names_are_errors() {
        let config = SimulationConfig::default();
        assert!(matches!(
            engine().simulate(&config, "other"),
            Err(EngineError::Unknown { .. })
        ));
        assert!(engine().first_passage_time(&config, "nope").is_err());
        assert_eq!(
            engine()
                .reachability(&config, &ReachabilityQuery::new("allInfected"))
                .unwrap(),
            0.25
        );
    }
}
