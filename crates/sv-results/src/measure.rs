//! Measure keys and per-measure statistics series.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sv_core::ensure_finite;

use crate::{ResultsError, ResultsResult};

/// Which flavour of a measure a series holds.
///
/// On the wire the kind is the leading sigil of the key: `#` for absolute
/// quantities, `%` for the normalized counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureKind {
    #[default]
    Quantity,
    Percentage,
}

impl MeasureKind {
    pub fn sigil(self) -> char {
        match self {
            MeasureKind::Quantity => '#',
            MeasureKind::Percentage => '%',
        }
    }

    pub fn from_sigil(c: char) -> Option<Self> {
        match c {
            '#' => Some(MeasureKind::Quantity),
            '%' => Some(MeasureKind::Percentage),
            _ => None,
        }
    }

    pub fn other(self) -> Self {
        match self {
            MeasureKind::Quantity => MeasureKind::Percentage,
            MeasureKind::Percentage => MeasureKind::Quantity,
        }
    }
}

impl fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureKind::Quantity => write!(f, "quantity"),
            MeasureKind::Percentage => write!(f, "percentage"),
        }
    }
}

/// A parsed measure key: kind plus base name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeasureKey {
    kind: MeasureKind,
    name: String,
}

impl MeasureKey {
    pub fn new(kind: MeasureKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn parse(raw: &str) -> ResultsResult<Self> {
        let mut chars = raw.chars();
        let sigil = chars.next().ok_or(ResultsError::EmptyKey)?;
        let kind = MeasureKind::from_sigil(sigil).ok_or_else(|| ResultsError::MissingSigil {
            key: raw.to_string(),
        })?;
        let name = chars.as_str();
        if name.is_empty() {
            return Err(ResultsError::EmptyKey);
        }
        Ok(Self::new(kind, name))
    }

    pub fn kind(&self) -> MeasureKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The same measure under the other sigil.
    pub fn counterpart(&self) -> Self {
        Self::new(self.kind.other(), self.name.clone())
    }
}

impl fmt::Display for MeasureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.sigil(), self.name)
    }
}

impl FromStr for MeasureKey {
    type Err = ResultsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One timestep of a measure's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub mean: f64,
    pub sd: f64,
    pub ci: f64,
}

impl Sample {
    pub fn new(time: f64, mean: f64, sd: f64, ci: f64) -> Self {
        Self { time, mean, sd, ci }
    }

    pub fn to_row(self) -> [f64; 4] {
        [self.time, self.mean, self.sd, self.ci]
    }
}

/// Ordered samples of one measure over a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasureSeries {
    samples: Vec<Sample>,
}

impl MeasureSeries {
    /// Build a series from raw `[time, mean, sd, ci]` rows.
    ///
    /// `key` is only used to name the measure in errors.
    pub fn from_rows<R: AsRef<[f64]>>(key: &str, rows: &[R]) -> ResultsResult<Self> {
        let mut samples = Vec::with_capacity(rows.len());
        let mut last_time = f64::NEG_INFINITY;
        for (row_idx, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let [time, mean, sd, ci] = row else {
                return Err(ResultsError::RowArity {
                    key: key.to_string(),
                    row: row_idx,
                    len: row.len(),
                });
            };
            for (value, what) in [(time, "time"), (mean, "mean"), (sd, "sd"), (ci, "ci")] {
                ensure_finite(*value, what).map_err(|source| ResultsError::InvalidValue {
                    key: key.to_string(),
                    row: row_idx,
                    source,
                })?;
            }
            if *sd < 0.0 || *ci < 0.0 {
                return Err(ResultsError::NegativeSpread {
                    key: key.to_string(),
                    row: row_idx,
                });
            }
            if *time < last_time {
                return Err(ResultsError::NonMonotonicTime {
                    key: key.to_string(),
                    row: row_idx,
                });
            }
            last_time = *time;
            samples.push(Sample::new(*time, *mean, *sd, *ci));
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    pub fn means(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.mean).collect()
    }

    pub fn sds(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.sd).collect()
    }

    pub fn cis(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.ci).collect()
    }

    pub fn time_range(&self) -> Option<(f64, f64)> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        Some((first.time, last.time))
    }

    pub fn to_rows(&self) -> Vec<[f64; 4]> {
        self.samples.iter().map(|s| s.to_row()).collect()
    }
}
