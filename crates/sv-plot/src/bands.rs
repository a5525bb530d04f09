//! Spread envelopes around a mean line.

use sv_results::MeasureSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spread {
    StandardDeviation,
    ConfidenceInterval,
}

impl Spread {
    /// Panel title suffix.
    pub fn label(self) -> &'static str {
        match self {
            Spread::StandardDeviation => "s.d.",
            Spread::ConfidenceInterval => "c.i.",
        }
    }
}

/// Pointwise `mean ± spread` over a series.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub time: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

impl Envelope {
    pub fn of(series: &MeasureSeries, spread: Spread) -> Self {
        let mut time = Vec::with_capacity(series.len());
        let mut upper = Vec::with_capacity(series.len());
        let mut lower = Vec::with_capacity(series.len());
        for s in series.samples() {
            let width = match spread {
                Spread::StandardDeviation => s.sd,
                Spread::ConfidenceInterval => s.ci,
            };
            time.push(s.time);
            upper.push(s.mean + width);
            lower.push(s.mean - width);
        }
        Self { time, upper, lower }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_follow_spread_column() {
        let series = MeasureSeries::from_rows("#A", &[[0.0, 10.0, 1.0, 2.0]]).unwrap();
        let sd = Envelope::of(&series, Spread::StandardDeviation);
        assert_eq!((sd.upper[0], sd.lower[0]), (11.0, 9.0));
        let ci = Envelope::of(&series, Spread::ConfidenceInterval);
        assert_eq!((ci.upper[0], ci.lower[0]), (12.0, 8.0));
    }
}
