//! sv-plot: chart construction for simulation traces.
//!
//! Charts are built as plain data ([`Figure`]) so any renderer can draw
//! them; the desktop viewer and the JSON export both consume the same model.

pub mod bands;
pub mod chart;
pub mod plotter;
pub mod settings;

pub use bands::{Envelope, Spread};
pub use chart::{read_figures, write_figures, BandTrace, Figure, LineTrace, Panel, Trace};
pub use plotter::{StatisticsPlotter, TracePlotExt};
pub use settings::{PlotLayout, PlotSettings, Theme};

pub type PlotResult<T> = Result<T, PlotError>;

#[derive(thiserror::Error, Debug)]
pub enum PlotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid plot settings: {0}")]
    InvalidSettings(String),
}
