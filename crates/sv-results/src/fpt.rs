//! First-passage-time statistics.
//!
//! The engine reports a fixed set of numeric statistics, but only the
//! populated prefix is meaningful: with no tests nothing else is stored, and
//! with no hits only the counts are.
//
// TODO: confirm with the engine owners whether hits == 0 with tests > 0 can
// hide an upstream failure; the short-circuit is kept as the engine reports it.

use std::fmt;

use serde::{Deserialize, Serialize};
use sv_core::round_to;

use crate::profile::{Profiled, ProfilerReading};

/// Accessors exposed by an engine first-passage-time object.
pub trait FirstPassageTimeSource {
    fn tests(&self) -> u64;
    fn hits(&self) -> u64;
    fn mean(&self) -> f64;
    fn standard_deviation(&self) -> f64;
    fn min(&self) -> f64;
    fn q1(&self) -> f64;
    fn q2(&self) -> f64;
    fn q3(&self) -> f64;
    fn max(&self) -> f64;
}

/// Plain-data form of an engine first-passage-time object.
///
/// Missing fields default to zero so degenerate payloads deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FirstPassageTimePayload {
    pub tests: u64,
    pub hits: u64,
    pub mean: f64,
    pub sd: f64,
    pub min: f64,
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub max: f64,
}

impl FirstPassageTimeSource for FirstPassageTimePayload {
    fn tests(&self) -> u64 {
        self.tests
    }
    fn hits(&self) -> u64 {
        self.hits
    }
    fn mean(&self) -> f64 {
        self.mean
    }
    fn standard_deviation(&self) -> f64 {
        self.sd
    }
    fn min(&self) -> f64 {
        self.min
    }
    fn q1(&self) -> f64 {
        self.q1
    }
    fn q2(&self) -> f64 {
        self.q2
    }
    fn q3(&self) -> f64 {
        self.q3
    }
    fn max(&self) -> f64 {
        self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FirstPassageTimeSummary {
    pub mean: f64,
    pub sd: f64,
    pub min: f64,
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub max: f64,
}

impl FirstPassageTimeSummary {
    fn fields(&self) -> [(&'static str, f64); 7] {
        [
            ("mean", self.mean),
            ("sd", self.sd),
            ("min", self.min),
            ("q1", self.q1),
            ("q2", self.q2),
            ("q3", self.q3),
            ("max", self.max),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirstPassageTimeResult {
    tests: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    hits: Option<u64>,
    #[serde(flatten)]
    summary: Option<FirstPassageTimeSummary>,
    #[serde(skip)]
    reading: Option<ProfilerReading>,
}

impl FirstPassageTimeResult {
    pub fn from_source<S: FirstPassageTimeSource + ?Sized>(source: &S) -> Self {
        let tests = source.tests();
        if tests == 0 {
            return Self::degenerate(0, None);
        }
        let hits = source.hits();
        if hits == 0 {
            return Self::degenerate(tests, Some(0));
        }
        Self {
            tests,
            hits: Some(hits),
            summary: Some(FirstPassageTimeSummary {
                mean: source.mean(),
                sd: source.standard_deviation(),
                min: source.min(),
                q1: source.q1(),
                q2: source.q2(),
                q3: source.q3(),
                max: source.max(),
            }),
            reading: None,
        }
    }

    fn degenerate(tests: u64, hits: Option<u64>) -> Self {
        Self {
            tests,
            hits,
            summary: None,
            reading: None,
        }
    }

    pub fn tests(&self) -> u64 {
        self.tests
    }

    /// `None` when no tests were run.
    pub fn hits(&self) -> Option<u64> {
        self.hits
    }

    /// `None` unless at least one test hit.
    pub fn summary(&self) -> Option<&FirstPassageTimeSummary> {
        self.summary.as_ref()
    }

    /// Dict view of the populated fields, in reporting order.
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// One-line view with full precision.
    pub fn summary_line(&self) -> String {
        let mut line = format!("tests : {} - ", self.tests);
        let Some(hits) = self.hits else {
            return line;
        };
        line.push_str(&format!("hits : {} - ", hits));
        if let Some(summary) = &self.summary {
            for (name, value) in summary.fields() {
                line.push_str(&format!("{} : {} - ", name, value));
            }
        }
        line
    }
}

impl fmt::Display for FirstPassageTimeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tests : {}", self.tests)?;
        let Some(hits) = self.hits else {
            return Ok(());
        };
        writeln!(f, "Hits  : {}", hits)?;
        let Some(s) = &self.summary else {
            return Ok(());
        };
        writeln!(f, "Mean  : {}", round_to(s.mean, 2))?;
        writeln!(f, "SD    : {}", round_to(s.sd, 2))?;
        writeln!(f, "Min   : {}", round_to(s.min, 2))?;
        writeln!(f, "Q1    : {}", round_to(s.q1, 2))?;
        writeln!(f, "Q2    : {}", round_to(s.q2, 2))?;
        writeln!(f, "Q3    : {}", round_to(s.q3, 2))?;
        writeln!(f, "Max   : {}", round_to(s.max, 2))
    }
}

impl Profiled for FirstPassageTimeResult {
    fn set_profiler_reading(&mut self, reading: ProfilerReading) {
        self.reading = Some(reading);
    }

    fn profiler_reading(&self) -> Option<&ProfilerReading> {
        self.reading.as_ref()
    }
}
