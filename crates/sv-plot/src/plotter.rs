//! Detail and ensemble charts over a simulation trace.

use std::collections::HashMap;

use sv_core::{Palette, Rgb};
use sv_results::{MeasureKey, MeasureKind, MeasureSeries, SimulationTraceResult};

use crate::bands::{Envelope, Spread};
use crate::chart::{BandTrace, Figure, LineTrace, Panel, Trace};
use crate::settings::{PlotLayout, PlotSettings, Theme};

pub const DETAILS_TITLE: &str = "Measures with standard deviation and confidence interval";
pub const ENSEMBLE_TITLE: &str = "Measures ensemble";
pub const ENSEMBLE_WIDTH: u32 = 800;
/// Opacity of every spread envelope.
pub const FILL_ALPHA: f64 = 0.2;

/// Builds charts for one trace.
///
/// Colors are assigned once, at construction: the i-th quantity measure in
/// engine order takes the i-th palette color and its percentage counterpart
/// takes the same one. Percentage measures without a quantity counterpart
/// continue the cycle.
#[derive(Debug, Clone)]
pub struct StatisticsPlotter<'a> {
    trace: &'a SimulationTraceResult,
    settings: PlotSettings,
    palette: Palette,
    colors: HashMap<MeasureKey, Rgb>,
}

impl<'a> StatisticsPlotter<'a> {
    pub fn new(trace: &'a SimulationTraceResult) -> Self {
        Self::with_settings(trace, PlotSettings::default())
    }

    pub fn with_settings(trace: &'a SimulationTraceResult, settings: PlotSettings) -> Self {
        let palette = Palette::default();
        let colors = assign_colors(trace, &palette);
        Self {
            trace,
            settings,
            palette,
            colors,
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.colors = assign_colors(self.trace, &palette);
        self.palette = palette;
        self
    }

    pub fn settings(&self) -> &PlotSettings {
        &self.settings
    }

    pub fn measure_kind(&self) -> MeasureKind {
        self.settings.measure_kind
    }

    pub fn set_measure_kind(&mut self, kind: MeasureKind) {
        self.settings.measure_kind = kind;
    }

    pub fn show_quantities(&mut self) {
        self.set_measure_kind(MeasureKind::Quantity);
    }

    pub fn show_percentages(&mut self) {
        self.set_measure_kind(MeasureKind::Percentage);
    }

    pub fn layout(&self) -> PlotLayout {
        self.settings.layout
    }

    pub fn set_layout(&mut self, layout: PlotLayout) {
        self.settings.layout = layout;
    }

    pub fn set_show_sd(&mut self, show_sd: bool) {
        self.settings.show_sd = show_sd;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
    }

    pub fn color_of(&self, key: &MeasureKey) -> Option<Rgb> {
        self.colors.get(key).copied()
    }

    /// Series matching the active measure kind, in engine order.
    pub fn select_series(&self) -> Vec<(&'a MeasureKey, &'a MeasureSeries)> {
        self.trace.of_kind(self.settings.measure_kind).collect()
    }

    /// Sum of the first-timestep means of all quantity series.
    pub fn total_quantity(&self) -> f64 {
        self.trace.first_mean_sum(MeasureKind::Quantity)
    }

    /// Upper bound of the detail grid's shared y axis.
    pub fn y_upper_bound(&self) -> f64 {
        match self.settings.measure_kind {
            MeasureKind::Quantity => self.total_quantity(),
            MeasureKind::Percentage => 1.0,
        }
    }

    /// One row per selected measure; sd envelope left, ci envelope right.
    pub fn render_details(&self) -> Figure {
        let selected = self.select_series();
        let mut figure = Figure::new(DETAILS_TITLE, selected.len(), 2);
        figure.shared_x = true;
        figure.y_range = Some([0.0, self.y_upper_bound()]);
        figure.width = self.settings.width;
        figure.height = Some(self.settings.height);
        figure.theme = self.settings.theme;

        for (index, (key, series)) in selected.into_iter().enumerate() {
            let color = self.line_color(key);
            for (col, spread) in [(1, Spread::StandardDeviation), (2, Spread::ConfidenceInterval)] {
                let mut panel = Panel::new(index + 1, col)
                    .titled(format!("{} with {}", key.name(), spread.label()));
                panel.push(band(key.to_string(), series, spread, color, false, None));
                panel.push(mean_line(key, series, color, false, None));
                figure.panels.push(panel);
            }
        }
        tracing::debug!(rows = figure.rows, kind = %self.settings.measure_kind, "detail chart built");
        figure
    }

    /// Every selected mean on one timeline.
    ///
    /// With `show_sd`, each measure's envelope shares a legend group with its
    /// line, so hiding the legend entry hides both.
    pub fn render_ensemble(&self, show_sd: bool) -> Figure {
        let mut figure = Figure::new(ENSEMBLE_TITLE, 1, 1);
        figure.width = ENSEMBLE_WIDTH;
        figure.range_slider = true;
        figure.theme = self.settings.theme;

        let mut panel = Panel::new(1, 1);
        for (index, (key, series)) in self.select_series().into_iter().enumerate() {
            let color = self.line_color(key);
            if show_sd {
                let group = (index + 1).to_string();
                panel.push(band(
                    format!("{} with sd", key),
                    series,
                    Spread::StandardDeviation,
                    color,
                    true,
                    Some(group.clone()),
                ));
                panel.push(mean_line(key, series, color, false, Some(group)));
            } else {
                panel.push(mean_line(key, series, color, true, None));
            }
        }
        figure.panels.push(panel);
        tracing::debug!(traces = figure.trace_count(), show_sd, "ensemble chart built");
        figure
    }

    /// Charts selected by the layout toggle, details first.
    pub fn render(&self) -> Vec<Figure> {
        let layout = self.settings.layout;
        let mut figures = Vec::new();
        if layout.includes_details() {
            figures.push(self.render_details());
        }
        if layout.includes_ensemble() {
            figures.push(self.render_ensemble(self.settings.show_sd));
        }
        figures
    }

    fn line_color(&self, key: &MeasureKey) -> Rgb {
        self.color_of(key).unwrap_or_else(|| self.palette.color(0))
    }
}

fn assign_colors(trace: &SimulationTraceResult, palette: &Palette) -> HashMap<MeasureKey, Rgb> {
    let mut colors = HashMap::new();
    let mut next = 0;
    for (key, _) in trace.of_kind(MeasureKind::Quantity) {
        let color = palette.color(next);
        colors.insert(key.clone(), color);
        colors.insert(key.counterpart(), color);
        next += 1;
    }
    for (key, _) in trace.of_kind(MeasureKind::Percentage) {
        if !colors.contains_key(key) {
            colors.insert(key.clone(), palette.color(next));
            next += 1;
        }
    }
    colors
}

fn mean_line(
    key: &MeasureKey,
    series: &MeasureSeries,
    color: Rgb,
    show_legend: bool,
    legend_group: Option<String>,
) -> Trace {
    Trace::Line(LineTrace {
        name: key.to_string(),
        x: series.times(),
        y: series.means(),
        color,
        show_legend,
        legend_group,
    })
}

fn band(
    name: String,
    series: &MeasureSeries,
    spread: Spread,
    color: Rgb,
    show_legend: bool,
    legend_group: Option<String>,
) -> Trace {
    let envelope = Envelope::of(series, spread);
    Trace::Band(BandTrace {
        name,
        x: envelope.time,
        upper: envelope.upper,
        lower: envelope.lower,
        fill: color.with_alpha(FILL_ALPHA),
        show_legend,
        legend_group,
    })
}

/// Chart shortcuts on a trace, using default plotter settings.
pub trait TracePlotExt {
    fn plotter(&self) -> StatisticsPlotter<'_>;

    /// Ensemble chart of the quantity measures.
    fn plot(&self, show_sd: bool) -> Figure {
        self.plotter().render_ensemble(show_sd)
    }

    /// Detail grid of the quantity measures.
    fn plot_detailed(&self) -> Figure {
        self.plotter().render_details()
    }
}

impl TracePlotExt for SimulationTraceResult {
    fn plotter(&self) -> StatisticsPlotter<'_> {
        StatisticsPlotter::new(self)
    }
}
