use std::collections::HashMap;

use egui::{Color32, Stroke};
use egui_plot::{Legend, Line, Plot, PlotPoints, Polygon};
use sv_core::{Rgb, Rgba};
use sv_plot::{BandTrace, Figure, LineTrace, Panel, Trace};

/// Draws [`Figure`]s with egui_plot.
#[derive(Default)]
pub struct ChartView;

impl ChartView {
    pub fn show(&self, ui: &mut egui::Ui, figures: &[Figure]) {
        if figures.is_empty() {
            ui.label("Load a trace or a chart file to see its statistics");
            return;
        }
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (index, figure) in figures.iter().enumerate() {
                ui.heading(&figure.title);
                if figure.rows == 0 || figure.is_empty() {
                    ui.label("No measures of the selected kind");
                } else {
                    self.show_figure(ui, index, figure);
                }
                ui.separator();
            }
        });
    }

    fn show_figure(&self, ui: &mut egui::Ui, index: usize, figure: &Figure) {
        let x_range = x_extent(figure);
        let available = ui.available_width();
        let cell_width = (available / figure.cols.max(1) as f32) - 8.0;
        let cell_height = if figure.rows > 1 { 220.0 } else { 380.0 };

        for row in 1..=figure.rows {
            ui.horizontal(|ui| {
                for col in 1..=figure.cols {
                    let Some(panel) = figure.panel(row, col) else {
                        continue;
                    };
                    ui.vertical(|ui| {
                        if let Some(title) = &panel.title {
                            ui.label(title);
                        }
                        let mut plot = Plot::new(format!("figure_{index}_{row}_{col}"))
                            .width(cell_width)
                            .height(cell_height)
                            .x_axis_label("time");
                        if figure.panels.len() == 1 || panel.traces.iter().any(shows_legend) {
                            plot = plot.legend(Legend::default());
                        }
                        if figure.shared_x {
                            if let Some((lo, hi)) = x_range {
                                plot = plot.include_x(lo).include_x(hi);
                            }
                        }
                        if let Some([lo, hi]) = figure.y_range {
                            plot = plot.include_y(lo).include_y(hi);
                        }
                        plot.show(ui, |plot_ui| {
                            let names = legend_names(panel);
                            for (trace, name) in panel.traces.iter().zip(names) {
                                match trace {
                                    Trace::Band(band) => {
                                        for polygon in band_polygons(band, &name) {
                                            plot_ui.polygon(polygon);
                                        }
                                    }
                                    Trace::Line(line) => plot_ui.line(mean_line(line, &name)),
                                }
                            }
                        });
                    });
                }
            });
        }
    }
}

fn shows_legend(trace: &Trace) -> bool {
    match trace {
        Trace::Line(l) => l.show_legend,
        Trace::Band(b) => b.show_legend,
    }
}

/// Legend label per trace. egui_plot toggles items by name, so hidden
/// members of a legend group borrow the visible member's name; other
/// hidden traces get no label.
fn legend_names(panel: &Panel) -> Vec<String> {
    let group_labels: HashMap<&str, &str> = panel
        .traces
        .iter()
        .filter(|t| shows_legend(t))
        .filter_map(|t| t.legend_group().map(|g| (g, t.name())))
        .collect();
    panel
        .traces
        .iter()
        .map(|t| {
            if shows_legend(t) {
                t.name().to_string()
            } else {
                t.legend_group()
                    .and_then(|g| group_labels.get(g))
                    .map(|name| name.to_string())
                    .unwrap_or_default()
            }
        })
        .collect()
}

fn x_extent(figure: &Figure) -> Option<(f64, f64)> {
    figure
        .panels
        .iter()
        .flat_map(|p| p.traces.iter())
        .flat_map(|t| match t {
            Trace::Line(l) => l.x.iter(),
            Trace::Band(b) => b.x.iter(),
        })
        .fold(None, |acc, &x| match acc {
            None => Some((x, x)),
            Some((lo, hi)) => Some((f64::min(lo, x), f64::max(hi, x))),
        })
}

fn color(c: Rgb) -> Color32 {
    Color32::from_rgb(c.r, c.g, c.b)
}

fn fill(c: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(c.r, c.g, c.b, (c.a * 255.0).round() as u8)
}

fn mean_line(trace: &LineTrace, name: &str) -> Line {
    let points: Vec<[f64; 2]> = trace.x.iter().zip(&trace.y).map(|(&x, &y)| [x, y]).collect();
    Line::new(PlotPoints::from(points))
        .color(color(trace.color))
        .name(name)
}

/// Quads between consecutive samples. A whole band is generally not convex,
/// which egui's polygon fill cannot draw.
fn band_segments(band: &BandTrace) -> Vec<[[f64; 2]; 4]> {
    let n = band.x.len().min(band.upper.len()).min(band.lower.len());
    (1..n)
        .map(|i| {
            [
                [band.x[i - 1], band.lower[i - 1]],
                [band.x[i], band.lower[i]],
                [band.x[i], band.upper[i]],
                [band.x[i - 1], band.upper[i - 1]],
            ]
        })
        .collect()
}

fn band_polygons(band: &BandTrace, name: &str) -> Vec<Polygon> {
    band_segments(band)
        .into_iter()
        .map(|quad| {
            Polygon::new(PlotPoints::from(quad.to_vec()))
                .fill_color(fill(band.fill))
                .stroke(Stroke::NONE)
                .name(name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_results::SimulationTraceResult;
    use sv_plot::TracePlotExt;

    fn trace() -> SimulationTraceResult {
        SimulationTraceResult::from_json_str(
            r##"{"#A": [[0, 10, 1, 2], [1, 12, 1.5, 2.5], [2, 11, 1, 2]]}"##,
        )
        .unwrap()
    }

    #[test]
    fn one_quad_per_interval() {
        let figure = trace().plot_detailed();
        let band = figure.panel(1, 1).unwrap().bands().next().unwrap().clone();
        let quads = band_segments(&band);
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[0][0], [0.0, 9.0]);
        assert_eq!(quads[0][3], [0.0, 11.0]);
    }

    #[test]
    fn grouped_line_borrows_band_label() {
        let figure = trace().plot(true);
        let names = legend_names(figure.panel(1, 1).unwrap());
        assert_eq!(names, vec!["#A with sd", "#A with sd"]);
    }

    #[test]
    fn detail_traces_stay_out_of_legend() {
        let figure = trace().plot_detailed();
        let names = legend_names(figure.panel(1, 2).unwrap());
        assert!(names.iter().all(String::is_empty));
    }

    #[test]
    fn shared_x_extent_spans_all_panels() {
        assert_eq!(x_extent(&trace().plot_detailed()), Some((0.0, 2.0)));
    }
}
