//! Records of surrogate-assisted parameter synthesis runs.
//!
//! The engine hands back its objective and surrogate evaluators together with
//! the record. They are wrapped here as plain `Fn(&ParamMap) -> f64`
//! closures so callers can probe the fitted landscape without touching the
//! engine.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sv_core::Tolerances;

use crate::profile::{Profiled, ProfilerReading};
use crate::{ResultsError, ResultsResult};

/// Parameter name -> value.
pub type ParamMap = BTreeMap<String, f64>;

/// Convergence threshold between objective and surrogate at the optimum.
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 0.01;

/// A pure scalar function over parameter maps.
#[derive(Clone)]
pub struct Evaluator(Arc<dyn Fn(&ParamMap) -> f64 + Send + Sync>);

impl Evaluator {
    pub fn new(f: impl Fn(&ParamMap) -> f64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn evaluate(&self, params: &ParamMap) -> f64 {
        (self.0)(params)
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Evaluator(..)")
    }
}

/// A labelled predicate over parameter maps.
#[derive(Clone)]
pub struct Constraint {
    label: String,
    predicate: Arc<dyn Fn(&ParamMap) -> bool + Send + Sync>,
}

impl Constraint {
    pub fn new(
        label: impl Into<String>,
        predicate: impl Fn(&ParamMap) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn test(&self, params: &ParamMap) -> bool {
        (self.predicate)(params)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Closed interval bounding one search dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub fn new(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Axis-aligned box of named intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    dimensions: Vec<Interval>,
}

impl SearchSpace {
    pub fn new(dimensions: Vec<Interval>) -> ResultsResult<Self> {
        let mut names = BTreeSet::new();
        for d in &dimensions {
            if !(d.lower.is_finite() && d.upper.is_finite()) || d.lower > d.upper {
                return Err(ResultsError::InvalidBounds {
                    dimension: d.name.clone(),
                    lower: d.lower,
                    upper: d.upper,
                });
            }
            if !names.insert(d.name.as_str()) {
                return Err(ResultsError::DuplicateDimension {
                    dimension: d.name.clone(),
                });
            }
        }
        Ok(Self { dimensions })
    }

    pub fn dimensions(&self) -> &[Interval] {
        &self.dimensions
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.dimensions.iter().map(|d| d.name.clone()).collect();
        names.sort();
        names
    }

    pub fn interval(&self, name: &str) -> Option<&Interval> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// True when `point` names exactly these dimensions and lies inside.
    pub fn contains(&self, point: &ParamMap) -> bool {
        point.len() == self.dimensions.len()
            && point.iter().all(|(name, v)| {
                self.interval(name)
                    .map(|interval| interval.contains(*v))
                    .unwrap_or(false)
            })
    }
}

/// Goodness of fit of a surrogate model on one data split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    pub mse: f64,
    pub r_squared: f64,
}

impl fmt::Display for FitMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mse : {:.4} - r^2 : {:.4}", self.mse, self.r_squared)
    }
}

/// What the engine returns from a synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisPayload {
    pub optimization_algorithm: String,
    pub surrogate_model: String,
    pub sampling_strategy: String,
    pub minimization: bool,
    pub use_surrogate: bool,
    pub objective: Evaluator,
    pub surrogate: Option<Evaluator>,
    pub dataset: Vec<ParamMap>,
    pub search_space: SearchSpace,
    pub constraints: Vec<Constraint>,
    pub number_of_samples: usize,
    pub training_portion: f64,
    pub properties: BTreeMap<String, String>,
    pub in_sample_metrics: Option<FitMetrics>,
    pub out_of_sample_metrics: Option<FitMetrics>,
    pub optimal_coordinates: ParamMap,
    pub optimal_value_objective: f64,
    pub optimal_value_surrogate: Option<f64>,
}

/// Immutable outcome of a synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisRecord {
    payload: SynthesisPayload,
    reading: Option<ProfilerReading>,
}

impl SynthesisRecord {
    pub fn from_payload(payload: SynthesisPayload) -> ResultsResult<Self> {
        if !(payload.training_portion > 0.0 && payload.training_portion <= 1.0) {
            return Err(ResultsError::InvalidTrainingPortion {
                value: payload.training_portion,
            });
        }
        if payload.use_surrogate && payload.surrogate.is_none() {
            return Err(ResultsError::MissingSurrogate);
        }
        let expected = payload.search_space.names();
        let actual: Vec<String> = payload.optimal_coordinates.keys().cloned().collect();
        if expected != actual {
            return Err(ResultsError::DimensionMismatch {
                what: "optimal coordinates",
                expected,
                actual,
            });
        }
        for sample in &payload.dataset {
            let names: Vec<String> = sample.keys().cloned().collect();
            if names != expected {
                return Err(ResultsError::DimensionMismatch {
                    what: "dataset sample",
                    expected,
                    actual: names,
                });
            }
        }
        Ok(Self {
            payload,
            reading: None,
        })
    }

    pub fn optimization_algorithm(&self) -> &str {
        &self.payload.optimization_algorithm
    }

    pub fn surrogate_model(&self) -> &str {
        &self.payload.surrogate_model
    }

    pub fn sampling_strategy(&self) -> &str {
        &self.payload.sampling_strategy
    }

    pub fn is_minimization(&self) -> bool {
        self.payload.minimization
    }

    pub fn uses_surrogate(&self) -> bool {
        self.payload.use_surrogate
    }

    pub fn objective_function(&self) -> impl Fn(&ParamMap) -> f64 + Send + Sync + 'static {
        let objective = self.payload.objective.clone();
        move |params: &ParamMap| objective.evaluate(params)
    }

    pub fn surrogate_function(
        &self,
    ) -> Option<impl Fn(&ParamMap) -> f64 + Send + Sync + 'static> {
        let surrogate = self.payload.surrogate.clone()?;
        Some(move |params: &ParamMap| surrogate.evaluate(params))
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.payload.constraints
    }

    /// Predicates of every constraint, detached from their labels.
    pub fn constraint_predicates(
        &self,
    ) -> Vec<impl Fn(&ParamMap) -> bool + Send + Sync + 'static> {
        self.payload
            .constraints
            .iter()
            .cloned()
            .map(|c| move |params: &ParamMap| c.test(params))
            .collect()
    }

    pub fn satisfies_constraints(&self, params: &ParamMap) -> bool {
        self.payload.constraints.iter().all(|c| c.test(params))
    }

    pub fn dataset(&self) -> &[ParamMap] {
        &self.payload.dataset
    }

    /// Column view of the dataset: parameter name -> sampled values.
    pub fn dataset_columns(&self) -> BTreeMap<String, Vec<f64>> {
        let mut columns: BTreeMap<String, Vec<f64>> = self
            .payload
            .search_space
            .dimensions()
            .iter()
            .map(|d| (d.name.clone(), Vec::with_capacity(self.payload.dataset.len())))
            .collect();
        for sample in &self.payload.dataset {
            for (name, value) in sample {
                if let Some(column) = columns.get_mut(name) {
                    column.push(*value);
                }
            }
        }
        columns
    }

    pub fn search_space(&self) -> &SearchSpace {
        &self.payload.search_space
    }

    pub fn number_of_samples(&self) -> usize {
        self.payload.number_of_samples
    }

    pub fn training_portion(&self) -> f64 {
        self.payload.training_portion
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.payload.properties
    }

    pub fn in_sample_metrics(&self) -> Option<&FitMetrics> {
        self.payload.in_sample_metrics.as_ref()
    }

    pub fn out_of_sample_metrics(&self) -> Option<&FitMetrics> {
        self.payload.out_of_sample_metrics.as_ref()
    }

    pub fn optimal_coordinates(&self) -> &ParamMap {
        &self.payload.optimal_coordinates
    }

    pub fn optimal_value_objective(&self) -> f64 {
        self.payload.optimal_value_objective
    }

    pub fn optimal_value_surrogate(&self) -> Option<f64> {
        self.payload.optimal_value_surrogate
    }

    /// |objective - surrogate| at the optimum, when a surrogate was used.
    pub fn optimum_gap(&self) -> Option<f64> {
        self.payload
            .optimal_value_surrogate
            .map(|s| (self.payload.optimal_value_objective - s).abs())
    }

    pub fn is_converged(&self, threshold: f64) -> bool {
        let tol = Tolerances::default();
        self.optimum_gap()
            .map(|gap| gap <= threshold + tol.abs)
            .unwrap_or(false)
    }
}

impl fmt::Display for SynthesisRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.payload;
        writeln!(f, "Optimization algorithm : {}", p.optimization_algorithm)?;
        writeln!(f, "Surrogate model        : {}", p.surrogate_model)?;
        writeln!(f, "Sampling strategy      : {}", p.sampling_strategy)?;
        writeln!(
            f,
            "Problem                : {}",
            if p.minimization { "minimization" } else { "maximization" }
        )?;
        writeln!(f, "Samples                : {}", p.number_of_samples)?;
        for d in p.search_space.dimensions() {
            writeln!(f, "  {} in [{}, {}]", d.name, d.lower, d.upper)?;
        }
        if let Some(m) = &p.in_sample_metrics {
            writeln!(f, "In-sample fit          : {}", m)?;
        }
        if let Some(m) = &p.out_of_sample_metrics {
            writeln!(f, "Out-of-sample fit      : {}", m)?;
        }
        writeln!(f, "Optimal coordinates    :")?;
        for (name, value) in &p.optimal_coordinates {
            writeln!(f, "  {} = {}", name, value)?;
        }
        writeln!(f, "Objective at optimum   : {}", p.optimal_value_objective)?;
        if let Some(s) = p.optimal_value_surrogate {
            writeln!(f, "Surrogate at optimum   : {}", s)?;
        }
        Ok(())
    }
}

impl Profiled for SynthesisRecord {
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

    fn point(x: f64, y: f64) -> ParamMap {
        ParamMap::from([("x".to_string(), x), ("y".to_string(), y)])
    }

    fn payload() -> SynthesisPayload {
        let objective = Evaluator::new(|p| {
            let x = p.get("x").copied().unwrap_or(0.0);
            let y = p.get("y").copied().unwrap_or(0.0);
            (x - 1.0).powi(2) + (y + 2.0).powi(2)
        });
        let surrogate = Evaluator::new(|p| {
            let x = p.get("x").copied().unwrap_or(0.0);
            let y = p.get("y").copied().unwrap_or(0.0);
            (x - 1.0).powi(2) + (y + 2.0).powi(2) + 0.005
        });
        SynthesisPayload {
            optimization_algorithm: "pso".to_string(),
            surrogate_model: "rf".to_string(),
            sampling_strategy: "lhs".to_string(),
            minimization: true,
            use_surrogate: true,
            objective,
            surrogate: Some(surrogate),
            dataset: vec![point(0.0, 0.0), point(2.0, -3.0), point(-1.0, 4.0)],
            search_space: SearchSpace::new(vec![
                Interval::new("x", -5.0, 5.0),
                Interval::new("y", -5.0, 5.0),
            ])
            .unwrap(),
            constraints: vec![Constraint::new("x + y <= 0", |p| {
                p.values().sum::<f64>() <= 0.0
            })],
            number_of_samples: 3,
            training_portion: 0.8,
            properties: BTreeMap::new(),
            in_sample_metrics: Some(FitMetrics {
                mse: 0.01,
                r_squared: 0.99,
            }),
            out_of_sample_metrics: Some(FitMetrics {
                mse: 0.02,
                r_squared: 0.95,
            }),
            optimal_coordinates: point(1.0, -2.0),
            optimal_value_objective: 0.0,
            optimal_value_surrogate: Some(0.005),
        }
    }

    #[test]
    fn evaluators_are_plain_functions() {
        let record = SynthesisRecord::from_payload(payload()).unwrap();
        let objective = record.objective_function();
        assert_eq!(objective(&point(1.0, -2.0)), 0.0);
        assert_eq!(objective(&point(2.0, -2.0)), 1.0);
        let surrogate = record.surrogate_function().unwrap();
        assert!((surrogate(&point(1.0, -2.0)) - 0.005).abs() < 1e-12);
    }

    #[test]
    fn constraints_are_predicates() {
        let record = SynthesisRecord::from_payload(payload()).unwrap();
        assert_eq!(record.constraints()[0].label(), "x + y <= 0");
        assert!(record.satisfies_constraints(&point(1.0, -2.0)));
        assert!(!record.satisfies_constraints(&point(3.0, 1.0)));
        let predicates = record.constraint_predicates();
        assert_eq!(predicates.len(), 1);
        assert!(predicates[0](&point(-1.0, 0.0)));
    }

    #[test]
    fn convergence_uses_optimum_gap() {
        let record = SynthesisRecord::from_payload(payload()).unwrap();
        let gap = record.optimum_gap().unwrap();
        assert!((gap - 0.005).abs() < 1e-12);
        assert!(record.is_converged(DEFAULT_CONVERGENCE_THRESHOLD));
        assert!(!record.is_converged(0.001));
    }

    #[test]
    fn dataset_columns_follow_dimensions() {
        let record = SynthesisRecord::from_payload(payload()).unwrap();
        let columns = record.dataset_columns();
        assert_eq!(columns["x"], vec![0.0, 2.0, -1.0]);
        assert_eq!(columns["y"], vec![0.0, -3.0, 4.0]);
    }

    #[test]
    fn search_space_containment() {
        let record = SynthesisRecord::from_payload(payload()).unwrap();
        let space = record.search_space();
        assert!(space.contains(&point(0.0, 5.0)));
        assert!(!space.contains(&point(0.0, 5.1)));
        let mut extra = point(0.0, 0.0);
        extra.insert("z".to_string(), 0.0);
        assert!(!space.contains(&extra));
    }

    #[test]
    fn inverted_bounds_rejected() {
        let err = SearchSpace::new(vec![Interval::new("x", 1.0, 0.0)]).unwrap_err();
        assert!(matches!(err, ResultsError::InvalidBounds { .. }));
        let err = SearchSpace::new(vec![
            Interval::new("x", 0.0, 1.0),
            Interval::new("x", 0.0, 2.0),
        ])
        .unwrap_err();
        assert!(matches!(err, ResultsError::DuplicateDimension { .. }));
    }

    #[test]
    fn optimum_must_match_dimensions() {
        let mut p = payload();
        p.optimal_coordinates = ParamMap::from([("x".to_string(), 1.0)]);
        let err = SynthesisRecord::from_payload(p).unwrap_err();
        assert!(matches!(
            err,
            ResultsError::DimensionMismatch {
                what: "optimal coordinates",
                ..
            }
        ));
    }

    #[test]
    fn surrogate_required_when_used() {
        let mut p = payload();
        p.surrogate = None;
        assert!(matches!(
            SynthesisRecord::from_payload(p),
            Err(ResultsError::MissingSurrogate)
        ));
    }

    #[test]
    fn training_portion_checked() {
        let mut p = payload();
        p.training_portion = 0.0;
        assert!(SynthesisRecord::from_payload(p).is_err());
    }

    #[test]
    fn display_lists_optimum() {
        let record = SynthesisRecord::from_payload(payload()).unwrap();
        let text = record.to_string();
        assert!(text.contains("Optimization algorithm : pso"));
        assert!(text.contains("  x = 1"));
        assert!(text.contains("  y = -2"));
        assert!(text.contains("Surrogate at optimum   : 0.005"));
    }
}
