//! Reachability probability results.

use std::fmt;

use serde::{Deserialize, Serialize};
use sv_core::{nearly_equal, Tolerances};

use crate::profile::{Profiled, ProfilerReading};
use crate::{ResultsError, ResultsResult};

/// Parameters of a reachability query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReachabilityQuery {
    pub goal: String,
    #[serde(default = "default_error_bound")]
    pub delta: f64,
    #[serde(default = "default_error_bound")]
    pub epsilon: f64,
    #[serde(default)]
    pub condition: Option<String>,
}

fn default_error_bound() -> f64 {
    0.01
}

impl ReachabilityQuery {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            delta: default_error_bound(),
            epsilon: default_error_bound(),
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_bounds(mut self, delta: f64, epsilon: f64) -> Self {
        self.delta = delta;
        self.epsilon = epsilon;
        self
    }

    /// Progress message shown while the query runs.
    pub fn running_message(&self) -> String {
        let mut message = format!("Evaluating the reachability of {}", self.goal);
        if let Some(condition) = &self.condition {
            message.push_str(&format!(" satisfying the condition {}", condition));
        }
        message
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReachabilityResult {
    probability: f64,
    goal: String,
    delta: f64,
    epsilon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
    #[serde(skip)]
    reading: Option<ProfilerReading>,
}

impl ReachabilityResult {
    /// Estimates within rounding noise of 0 or 1 are snapped onto the bound.
    pub fn new(probability: f64, query: ReachabilityQuery) -> ResultsResult<Self> {
        let probability = snap_to_unit_interval(probability);
        if !(0.0..=1.0).contains(&probability) {
            return Err(ResultsError::InvalidProbability { value: probability });
        }
        Ok(Self {
            probability,
            goal: query.goal,
            delta: query.delta,
            epsilon: query.epsilon,
            condition: query.condition,
            reading: None,
        })
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "probability : {} - goal : {} - delta : {} - epsilon : {} - ",
            self.probability, self.goal, self.delta, self.epsilon
        );
        if let Some(condition) = &self.condition {
            line.push_str(&format!("condition : {} ", condition));
        }
        line
    }
}

fn snap_to_unit_interval(p: f64) -> f64 {
    let tol = Tolerances::default();
    if p > 1.0 && nearly_equal(p, 1.0, tol) {
        1.0
    } else if p < 0.0 && nearly_equal(p, 0.0, tol) {
        0.0
    } else {
        p
    }
}

impl fmt::Display for ReachabilityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Probability of reaching {} is", self.goal)?;
        writeln!(f, "{}", self.probability)?;
        if let Some(condition) = &self.condition {
            writeln!(f, "Fulfilling condition : {}", condition)?;
        }
        writeln!(f)?;
        writeln!(f, "error prob (epsilon) : {}", self.epsilon)?;
        writeln!(f, "error gap  (delta)   : {}", self.delta)
    }
}

impl Profiled for ReachabilityResult {
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

    #[test]
    fn defaults_match_engine_defaults() {
        let q = ReachabilityQuery::new("allInfected");
        assert_eq!(q.delta, 0.01);
        assert_eq!(q.epsilon, 0.01);
        assert!(q.condition.is_none());
        let parsed: ReachabilityQuery = serde_json::from_str(r#"{"goal": "g"}"#).unwrap();
        assert_eq!(parsed.delta, 0.01);
    }

    #[test]
    fn running_message_mentions_condition() {
        let q = ReachabilityQuery::new("goal").with_condition("safe");
        assert_eq!(
            q.running_message(),
            "Evaluating the reachability of goal satisfying the condition safe"
        );
    }

    #[test]
    fn views_without_condition() {
        let r = ReachabilityResult::new(0.25, ReachabilityQuery::new("g")).unwrap();
        assert_eq!(
            r.summary_line(),
            "probability : 0.25 - goal : g - delta : 0.01 - epsilon : 0.01 - "
        );
        assert_eq!(
            r.to_string(),
            "Probability of reaching g is\n0.25\n\nerror prob (epsilon) : 0.01\nerror gap  (delta)   : 0.01\n"
        );
        assert!(r.to_dict().get("condition").is_none());
    }

    #[test]
    fn views_with_condition() {
        let q = ReachabilityQuery::new("g")
            .with_condition("c")
            .with_bounds(0.05, 0.1);
        let r = ReachabilityResult::new(0.9, q).unwrap();
        assert_eq!(r.condition(), Some("c"));
        assert!(r.summary_line().ends_with("condition : c "));
        assert!(r.to_string().contains("Fulfilling condition : c\n"));
        assert_eq!(r.to_dict()["epsilon"], 0.1);
    }

    #[test]
    fn probability_outside_unit_interval_rejected() {
        assert!(ReachabilityResult::new(1.5, ReachabilityQuery::new("g")).is_err());
        assert!(ReachabilityResult::new(f64::NAN, ReachabilityQuery::new("g")).is_err());
        assert!(ReachabilityResult::new(1.0 + 1e-6, ReachabilityQuery::new("g")).is_err());
    }

    #[test]
    fn rounding_noise_at_the_bounds_is_snapped() {
        let above = ReachabilityResult::new(1.0000000000000002, ReachabilityQuery::new("g")).unwrap();
        assert_eq!(above.probability(), 1.0);
        let below = ReachabilityResult::new(-1e-15, ReachabilityQuery::new("g")).unwrap();
        assert_eq!(below.probability(), 0.0);
    }
}
