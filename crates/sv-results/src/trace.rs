//! Simulation trace results: measure key -> statistics series.

use std::collections::HashSet;

use serde_json::Value;

use crate::measure::{MeasureKey, MeasureKind, MeasureSeries};
use crate::profile::{Profiled, ProfilerReading};
use crate::{ResultsError, ResultsResult};

/// Raw engine shape: measure key to `[time, mean, sd, ci]` rows, in
/// engine order.
pub type TracePayload = Vec<(String, Vec<Vec<f64>>)>;

/// Normalized statistics of a simulation run.
///
/// Measures keep the order in which the engine reported them; color
/// assignment downstream depends on it.
#[derive(Debug, Clone, Default)]
pub struct SimulationTraceResult {
    measures: Vec<(MeasureKey, MeasureSeries)>,
    reading: Option<ProfilerReading>,
}

impl SimulationTraceResult {
    pub fn from_payload<I, K, R>(payload: I) -> ResultsResult<Self>
    where
        I: IntoIterator<Item = (K, Vec<R>)>,
        K: AsRef<str>,
        R: AsRef<[f64]>,
    {
        let mut measures = Vec::new();
        let mut seen = HashSet::new();
        for (raw_key, rows) in payload {
            let raw_key = raw_key.as_ref();
            let key = MeasureKey::parse(raw_key)?;
            if !seen.insert(key.clone()) {
                return Err(ResultsError::DuplicateMeasure {
                    key: raw_key.to_string(),
                });
            }
            let series = MeasureSeries::from_rows(raw_key, &rows)?;
            measures.push((key, series));
        }
        Ok(Self {
            measures,
            reading: None,
        })
    }

    /// Parse a JSON object `{"#A": [[t, mean, sd, ci], ...], ...}`.
    pub fn from_json_str(json: &str) -> ResultsResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> ResultsResult<Self> {
        let Value::Object(map) = value else {
            return Err(ResultsError::NotAMapping);
        };
        let mut payload: TracePayload = Vec::with_capacity(map.len());
        for (key, rows) in map {
            let rows: Vec<Vec<f64>> =
                serde_json::from_value(rows).map_err(|e| ResultsError::InvalidSeries {
                    key: key.clone(),
                    message: e.to_string(),
                })?;
            payload.push((key, rows));
        }
        Self::from_payload(payload)
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MeasureKey, &MeasureSeries)> {
        self.measures.iter().map(|(k, s)| (k, s))
    }

    pub fn keys(&self) -> impl Iterator<Item = &MeasureKey> {
        self.measures.iter().map(|(k, _)| k)
    }

    /// Measures of one kind, in engine order.
    pub fn of_kind(&self, kind: MeasureKind) -> impl Iterator<Item = (&MeasureKey, &MeasureSeries)> {
        self.iter().filter(move |(k, _)| k.kind() == kind)
    }

    pub fn get(&self, key: &MeasureKey) -> Option<&MeasureSeries> {
        self.measures
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, s)| s)
    }

    /// Look up by raw key such as `"#A"`.
    pub fn get_raw(&self, raw_key: &str) -> Option<&MeasureSeries> {
        let key = MeasureKey::parse(raw_key).ok()?;
        self.get(&key)
    }

    /// Base names in engine order, each listed once.
    pub fn measure_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.keys()
            .map(|k| k.name())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Sum of first-timestep means over every measure of `kind`.
    pub fn first_mean_sum(&self, kind: MeasureKind) -> f64 {
        self.of_kind(kind)
            .filter_map(|(_, s)| s.first())
            .map(|s| s.mean)
            .sum()
    }

    /// Earliest and latest time across all series.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        self.measures
            .iter()
            .filter_map(|(_, s)| s.time_range())
            .fold(None, |acc, (lo, hi)| match acc {
                None => Some((lo, hi)),
                Some((a, b)) => Some((a.min(lo), b.max(hi))),
            })
    }

    /// Back to the engine shape.
    pub fn to_payload(&self) -> TracePayload {
        self.measures
            .iter()
            .map(|(k, s)| {
                let rows = s.to_rows().into_iter().map(|r| r.to_vec()).collect();
                (k.to_string(), rows)
            })
            .collect()
    }

    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (k, s) in &self.measures {
            map.insert(k.to_string(), serde_json::json!(s.to_rows()));
        }
        Value::Object(map)
    }
}

impl Profiled for SimulationTraceResult {
    fn set_profiler_reading(&mut self, reading: ProfilerReading) {
        self.reading = Some(reading);
    }

    fn profiler_reading(&self) -> Option<&ProfilerReading> {
        self.reading.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> SimulationTraceResult {
        SimulationTraceResult::from_json_str(
            r##"{"#A": [[0,10,1,2],[1,12,1.5,2.5]], "%A": [[0,0.5,0.05,0.1],[1,0.6,0.07,0.12]]}"##,
        )
        .unwrap()
    }

    #[test]
    fn json_keeps_engine_order() {
        let trace = SimulationTraceResult::from_json_str(
            r##"{"#Z": [[0,1,0,0]], "#A": [[0,2,0,0]], "%Z": [[0,0.3,0,0]]}"##,
        )
        .unwrap();
        let keys: Vec<String> = trace.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["#Z", "#A", "%Z"]);
        assert_eq!(trace.measure_names(), vec!["Z", "A"]);
    }

    #[test]
    fn unmarked_key_fails_at_normalization() {
        let err = SimulationTraceResult::from_json_str(r#"{"A": [[0,1,0,0]]}"#).unwrap_err();
        assert!(matches!(err, ResultsError::MissingSigil { .. }));
    }

    #[test]
    fn non_numeric_rows_name_the_key() {
        let err = SimulationTraceResult::from_json_str(r##"{"#A": [[0,"x",0,0]]}"##).unwrap_err();
        assert!(matches!(err, ResultsError::InvalidSeries { ref key, .. } if key == "#A"));
    }

    #[test]
    fn top_level_must_be_object() {
        let err = SimulationTraceResult::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, ResultsError::NotAMapping));
    }

    #[test]
    fn duplicate_keys_rejected() {
        let payload = vec![
            ("#A".to_string(), vec![vec![0.0, 1.0, 0.0, 0.0]]),
            ("#A".to_string(), vec![vec![0.0, 2.0, 0.0, 0.0]]),
        ];
        assert!(matches!(
            SimulationTraceResult::from_payload(payload),
            Err(ResultsError::DuplicateMeasure { .. })
        ));
    }

    #[test]
    fn first_mean_sum_per_kind() {
        let trace = example();
        assert_eq!(trace.first_mean_sum(MeasureKind::Quantity), 10.0);
        assert_eq!(trace.first_mean_sum(MeasureKind::Percentage), 0.5);
    }

    #[test]
    fn payload_roundtrip_preserves_rows() {
        let trace = example();
        let again = SimulationTraceResult::from_payload(trace.to_payload()).unwrap();
        assert_eq!(again.get_raw("%A"), trace.get_raw("%A"));
        assert_eq!(trace.to_json()["#A"][1][2], 1.5);
    }

    #[test]
    fn empty_payload_is_valid() {
        let trace = SimulationTraceResult::from_json_str("{}").unwrap();
        assert!(trace.is_empty());
        assert_eq!(trace.time_range(), None);
        assert_eq!(trace.first_mean_sum(MeasureKind::Quantity), 0.0);
    }

    #[test]
    fn profiler_reading_overwrites() {
        let mut trace = example();
        assert!(trace.profiler_reading().is_none());
        trace.set_profiler_reading(ProfilerReading::new(1.0, 2.0));
        trace.set_profiler_reading(ProfilerReading::new(3.0, 4.0));
        assert_eq!(trace.profiler_reading(), Some(&ProfilerReading::new(3.0, 4.0)));
    }
}
