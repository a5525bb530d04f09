//! Renderer-independent chart model.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sv_core::{Rgb, Rgba};

use crate::settings::Theme;
use crate::PlotResult;

/// A mean line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineTrace {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub color: Rgb,
    pub show_legend: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_group: Option<String>,
}

/// A filled region between two curves; its edges are drawn with zero width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTrace {
    pub name: String,
    pub x: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    pub fill: Rgba,
    pub show_legend: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trace {
    Line(LineTrace),
    Band(BandTrace),
}

impl Trace {
    pub fn name(&self) -> &str {
        match self {
            Trace::Line(l) => &l.name,
            Trace::Band(b) => &b.name,
        }
    }

    pub fn legend_group(&self) -> Option<&str> {
        match self {
            Trace::Line(l) => l.legend_group.as_deref(),
            Trace::Band(b) => b.legend_group.as_deref(),
        }
    }
}

/// One cell of the subplot grid. Rows and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub row: usize,
    pub col: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub traces: Vec<Trace>,
}

impl Panel {
    pub fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            title: None,
            traces: Vec::new(),
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn push(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    pub fn lines(&self) -> impl Iterator<Item = &LineTrace> {
        self.traces.iter().filter_map(|t| match t {
            Trace::Line(l) => Some(l),
            Trace::Band(_) => None,
        })
    }

    pub fn bands(&self) -> impl Iterator<Item = &BandTrace> {
        self.traces.iter().filter_map(|t| match t {
            Trace::Band(b) => Some(b),
            Trace::Line(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub title: String,
    pub rows: usize,
    pub cols: usize,
    pub shared_x: bool,
    /// Fixed y range applied to every panel, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_range: Option<[f64; 2]>,
    pub width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub range_slider: bool,
    pub theme: Theme,
    pub panels: Vec<Panel>,
}

impl Figure {
    pub fn new(title: impl Into<String>, rows: usize, cols: usize) -> Self {
        Self {
            title: title.into(),
            rows,
            cols,
            shared_x: false,
            y_range: None,
            width: 800,
            height: None,
            range_slider: false,
            theme: Theme::default(),
            panels: Vec::new(),
        }
    }

    pub fn panel(&self, row: usize, col: usize) -> Option<&Panel> {
        self.panels.iter().find(|p| p.row == row && p.col == col)
    }

    pub fn trace_count(&self) -> usize {
        self.panels.iter().map(|p| p.traces.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.trace_count() == 0
    }

    pub fn to_json(&self) -> PlotResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> PlotResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_json(&self, path: &Path) -> PlotResult<()> {
        fs::write(path, self.to_json()?)?;
        tracing::debug!(path = %path.display(), title = %self.title, "chart written");
        Ok(())
    }

    pub fn read_json(path: &Path) -> PlotResult<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Several figures exported together, as produced by a full render.
pub fn write_figures(figures: &[Figure], path: &Path) -> PlotResult<()> {
    fs::write(path, serde_json::to_string_pretty(figures)?)?;
    Ok(())
}

pub fn read_figures(path: &Path) -> PlotResult<Vec<Figure>> {
    let raw = fs::read_to_string(path)?;
    // a single exported figure is accepted as well
    match serde_json::from_str::<Vec<Figure>>(&raw) {
        Ok(figures) => Ok(figures),
        Err(_) => Ok(vec![Figure::from_json_str(&raw)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_figure() -> Figure {
        let mut panel = Panel::new(1, 1).titled("A with s.d.");
        panel.push(Trace::Line(LineTrace {
            name: "#A".into(),
            x: vec![0.0, 1.0],
            y: vec![10.0, 12.0],
            color: Rgb::new(31, 119, 180),
            show_legend: false,
            legend_group: None,
        }));
        let mut fig = Figure::new("t", 1, 1);
        fig.panels.push(panel);
        fig
    }

    #[test]
    fn json_uses_css_colors_and_tagged_traces() {
        let json = sample_figure().to_json().unwrap();
        assert!(json.contains("\"rgb(31, 119, 180)\""), "{json}");
        assert!(json.contains("\"type\": \"line\""), "{json}");
        assert_eq!(Figure::from_json_str(&json).unwrap(), sample_figure());
    }

    #[test]
    fn lookup_by_cell() {
        let fig = sample_figure();
        assert!(fig.panel(1, 1).is_some());
        assert!(fig.panel(1, 2).is_none());
        assert_eq!(fig.trace_count(), 1);
        assert_eq!(fig.panel(1, 1).unwrap().lines().count(), 1);
    }
}
