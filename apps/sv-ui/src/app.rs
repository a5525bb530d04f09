use std::fs;
use std::path::PathBuf;

use sv_app::SessionConfig;
use sv_plot::{read_figures, Figure, PlotLayout, PlotSettings, StatisticsPlotter, Theme};
use sv_results::{MeasureKind, Profiled, SimulationTraceResult};

use crate::run_worker::{SimulationWorker, WorkerMessage};
use crate::views::ChartView;

pub struct StochViewApp {
    session: SessionConfig,
    path_input: String,
    label_input: String,
    trace: Option<SimulationTraceResult>,
    figures: Vec<Figure>,
    chart_view: ChartView,
    worker: Option<SimulationWorker>,
    status: Option<String>,
}

impl StochViewApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let session = std::env::args()
            .nth(1)
            .map(PathBuf::from)
            .and_then(|path| match SessionConfig::load(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring session config");
                    None
                }
            })
            .unwrap_or_default();
        Self {
            session,
            path_input: String::new(),
            label_input: "run".to_string(),
            trace: None,
            figures: Vec::new(),
            chart_view: ChartView,
            worker: None,
            status: None,
        }
    }

    fn settings(&self) -> &PlotSettings {
        &self.session.plot
    }

    fn rerender(&mut self) {
        if let Some(trace) = &self.trace {
            self.figures = StatisticsPlotter::with_settings(trace, self.settings().clone()).render();
        }
    }

    fn set_trace(&mut self, trace: SimulationTraceResult) {
        self.status = Some(match trace.profiler_reading() {
            Some(reading) => format!("{} measures - {}", trace.len(), reading),
            None => format!("{} measures", trace.len()),
        });
        self.trace = Some(trace);
        self.rerender();
    }

    fn load_trace(&mut self) {
        let path = PathBuf::from(self.path_input.trim());
        let loaded = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| SimulationTraceResult::from_json_str(&raw).map_err(|e| e.to_string()));
        match loaded {
            Ok(trace) => self.set_trace(trace),
            Err(e) => self.status = Some(format!("Error loading trace: {}", e)),
        }
    }

    fn load_charts(&mut self) {
        let path = PathBuf::from(self.path_input.trim());
        match read_figures(&path) {
            Ok(figures) => {
                self.trace = None;
                self.status = Some(format!("{} chart(s) loaded", figures.len()));
                self.figures = figures;
            }
            Err(e) => self.status = Some(format!("Error loading charts: {}", e)),
        }
    }

    fn poll_worker(&mut self) {
        let Some(worker) = &self.worker else {
            return;
        };
        if let Ok(message) = worker.rx.try_recv() {
            self.worker = None;
            match message {
                WorkerMessage::Complete { trace } => self.set_trace(trace),
                WorkerMessage::Error { message } => self.status = Some(message),
            }
        }
    }

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("File:");
            ui.text_edit_singleline(&mut self.path_input);
            if ui.button("Load trace").clicked() {
                self.load_trace();
            }
            if ui.button("Load charts").clicked() {
                self.load_charts();
            }
            ui.separator();
            ui.label("Label:");
            ui.add(egui::TextEdit::singleline(&mut self.label_input).desired_width(80.0));
            let running = self.worker.is_some();
            if ui
                .add_enabled(!running, egui::Button::new("Simulate replay"))
                .clicked()
            {
                let path = PathBuf::from(self.path_input.trim());
                self.worker = Some(SimulationWorker::start(
                    &path,
                    &self.label_input,
                    &self.session,
                ));
                self.status = Some("Simulating...".to_string());
            }
            if running {
                ui.spinner();
            }
        });
        if let Some(status) = &self.status {
            ui.label(status);
        }
    }

    fn show_settings(&mut self, ui: &mut egui::Ui) {
        ui.heading("Plot");
        let mut changed = false;
        let plot = &mut self.session.plot;

        ui.label("Measures");
        changed |= ui
            .radio_value(&mut plot.measure_kind, MeasureKind::Quantity, "Quantity (#)")
            .changed();
        changed |= ui
            .radio_value(&mut plot.measure_kind, MeasureKind::Percentage, "Percentage (%)")
            .changed();

        ui.separator();
        ui.label("Layout");
        for (layout, label) in [
            (PlotLayout::All, "All"),
            (PlotLayout::Details, "Details"),
            (PlotLayout::Ensemble, "Ensemble"),
        ] {
            changed |= ui.radio_value(&mut plot.layout, layout, label).changed();
        }

        ui.separator();
        changed |= ui.checkbox(&mut plot.show_sd, "Ensemble s.d. bands").changed();
        let mut dark = plot.theme == Theme::Dark;
        if ui.checkbox(&mut dark, "Dark theme").changed() {
            plot.theme = if dark { Theme::Dark } else { Theme::Light };
            changed = true;
        }

        if changed {
            self.rerender();
        }
    }
}

impl eframe::App for StochViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_worker();
        if self.worker.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        ctx.set_visuals(match self.settings().theme {
            Theme::Dark => egui::Visuals::dark(),
            Theme::Light => egui::Visuals::light(),
        });

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.show_toolbar(ui));
        egui::SidePanel::left("settings")
            .resizable(false)
            .show(ctx, |ui| self.show_settings(ui));
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_view.show(ui, &self.figures);
        });
    }
}
