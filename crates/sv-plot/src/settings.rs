//! Plotter toggles and output dimensions.

use serde::{Deserialize, Serialize};
use sv_results::MeasureKind;

use crate::{PlotError, PlotResult};

/// Which chart forms [`crate::StatisticsPlotter::render`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotLayout {
    Ensemble,
    Details,
    #[default]
    All,
}

impl PlotLayout {
    pub fn includes_details(self) -> bool {
        matches!(self, PlotLayout::Details | PlotLayout::All)
    }

    pub fn includes_ensemble(self) -> bool {
        matches!(self, PlotLayout::Ensemble | PlotLayout::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    pub measure_kind: MeasureKind,
    pub layout: PlotLayout,
    /// Shade a ± sd envelope around each ensemble line.
    pub show_sd: bool,
    pub theme: Theme,
    pub width: u32,
    pub height: u32,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            measure_kind: MeasureKind::Quantity,
            layout: PlotLayout::All,
            show_sd: false,
            theme: Theme::Light,
            width: 800,
            height: 1000,
        }
    }
}

impl PlotSettings {
    pub fn validate(&self) -> PlotResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PlotError::InvalidSettings(format!(
                "chart size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}
