//! Session configuration loaded from YAML or JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sv_plot::PlotSettings;

use crate::engine::SimulationConfig;
use crate::error::{AppError, AppResult};
use crate::progress::AnimationStyle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerSettings {
    pub animation: AnimationStyle,
    pub frame_interval_ms: u64,
    pub sample_interval_ms: u64,
    /// Suppress progress output.
    pub silent: bool,
}

impl Default for ProfilerSettings {
    fn default() -> Self {
        Self {
            animation: AnimationStyle::Snake,
            frame_interval_ms: 500,
            sample_interval_ms: 1,
            silent: false,
        }
    }
}

impl ProfilerSettings {
    pub fn validate(&self) -> AppResult<()> {
        if self.frame_interval_ms == 0 {
            return Err(AppError::Validation(
                "frame_interval_ms must be positive".to_string(),
            ));
        }
        if !(1..10).contains(&self.sample_interval_ms) {
            return Err(AppError::Validation(format!(
                "sample_interval_ms must lie in [1, 9], got {}",
                self.sample_interval_ms
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub simulation: SimulationConfig,
    pub plot: PlotSettings,
    pub profiler: ProfilerSettings,
}

impl SessionConfig {
    /// Loads by extension: `.yaml`/`.yml` or `.json`.
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| AppError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let config = match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&raw)?,
            Some("json") => Self::from_json_str(&raw)?,
            _ => {
                return Err(AppError::ConfigFormat {
                    path: path.to_path_buf(),
                });
            }
        };
        tracing::debug!(path = %path.display(), "session config loaded");
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> AppResult<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> AppResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.simulation.validate()?;
        self.profiler.validate()?;
        self.plot.validate()?;
        Ok(())
    }
}
