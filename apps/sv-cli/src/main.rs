use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sv_app::{AppError, AppResult, ReplayEngine, RuntimeClient, SessionConfig};
use sv_plot::{write_figures, PlotLayout, PlotSettings, StatisticsPlotter, Theme};
use sv_results::{MeasureKind, Profiled, ReachabilityQuery, SimulationTraceResult};

#[derive(Parser)]
#[command(name = "sv-cli")]
#[command(about = "StochView CLI - profile stochastic simulation calls and chart their statistics", long_about = None)]
struct Cli {
    /// Session config (YAML or JSON); defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation against a recorded engine script
    Simulate {
        /// Replay script or bare trace JSON
        replay: PathBuf,
        /// Simulation label
        #[arg(short, long, default_value = "run")]
        label: String,
        /// Write the rendered charts as JSON
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        plot: PlotArgs,
    },
    /// Render charts from a saved trace
    Plot {
        /// Trace JSON: {"#A": [[t, mean, sd, ci], ...], ...}
        trace: PathBuf,
        /// Output JSON file
        #[arg(short, long)]
        out: PathBuf,
        #[command(flatten)]
        plot: PlotArgs,
    },
    /// Evaluate first-passage-time statistics of a predicate
    Fpt {
        replay: PathBuf,
        predicate: String,
    },
    /// Evaluate the probability of reaching a goal
    Reach {
        replay: PathBuf,
        goal: String,
        #[arg(long)]
        condition: Option<String>,
        #[arg(long, default_value_t = 0.01)]
        delta: f64,
        #[arg(long, default_value_t = 0.01)]
        epsilon: f64,
    },
    /// Print the effective session config
    ShowConfig,
}

#[derive(clap::Args)]
struct PlotArgs {
    /// Which measures to chart
    #[arg(long, value_enum)]
    kind: Option<KindArg>,
    /// Which charts to build
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,
    /// Shade a standard-deviation band in the ensemble chart
    #[arg(long)]
    show_sd: bool,
    #[arg(long)]
    dark: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Quantity,
    Percentage,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Ensemble,
    Details,
    All,
}

impl PlotArgs {
    fn apply(&self, mut settings: PlotSettings) -> PlotSettings {
        if let Some(kind) = self.kind {
            settings.measure_kind = match kind {
                KindArg::Quantity => MeasureKind::Quantity,
                KindArg::Percentage => MeasureKind::Percentage,
            };
        }
        if let Some(layout) = self.layout {
            settings.layout = match layout {
                LayoutArg::Ensemble => PlotLayout::Ensemble,
                LayoutArg::Details => PlotLayout::Details,
                LayoutArg::All => PlotLayout::All,
            };
        }
        settings.show_sd |= self.show_sd;
        if self.dark {
            settings.theme = Theme::Dark;
        }
        settings
    }
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let session = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    match cli.command {
        Commands::Simulate {
            replay,
            label,
            out,
            plot,
        } => cmd_simulate(&session, &replay, &label, out.as_deref(), &plot),
        Commands::Plot { trace, out, plot } => cmd_plot(&session, &trace, &out, &plot),
        Commands::Fpt { replay, predicate } => cmd_fpt(&session, &replay, &predicate),
        Commands::Reach {
            replay,
            goal,
            condition,
            delta,
            epsilon,
        } => {
            let mut query = ReachabilityQuery::new(goal).with_bounds(delta, epsilon);
            if let Some(c) = condition {
                query = query.with_condition(c);
            }
            cmd_reach(&session, &replay, &query)
        }
        Commands::ShowConfig => {
            print!("{}", session.to_yaml()?);
            Ok(())
        }
    }
}

fn client(session: &SessionConfig, replay: &Path) -> AppResult<RuntimeClient> {
    let engine = ReplayEngine::from_path(replay)?;
    Ok(RuntimeClient::new(Arc::new(engine)).with_profiler(session.profiler.clone()))
}

fn print_reading(result: &impl Profiled) {
    if let Some(reading) = result.profiler_reading() {
        println!("  {}", reading);
    }
}

fn cmd_simulate(
    session: &SessionConfig,
    replay: &Path,
    label: &str,
    out: Option<&Path>,
    plot: &PlotArgs,
) -> AppResult<()> {
    let trace = client(session, replay)?.simulate(&session.simulation, label)?;

    println!("✓ Simulation '{}' completed", label);
    println!("  Measures: {}", trace.measure_names().join(", "));
    if let Some((start, end)) = trace.time_range() {
        println!("  Time span: {} .. {}", start, end);
    }
    print_reading(&trace);

    if let Some(out) = out {
        render_to(&trace, plot.apply(session.plot.clone()), out)?;
    }
    Ok(())
}

fn cmd_plot(session: &SessionConfig, trace: &Path, out: &Path, plot: &PlotArgs) -> AppResult<()> {
    let raw = fs::read_to_string(trace).map_err(|source| AppError::FileRead {
        path: trace.to_path_buf(),
        source,
    })?;
    let trace = SimulationTraceResult::from_json_str(&raw)?;
    render_to(&trace, plot.apply(session.plot.clone()), out)
}

fn render_to(trace: &SimulationTraceResult, settings: PlotSettings, out: &Path) -> AppResult<()> {
    settings.validate()?;
    let plotter = StatisticsPlotter::with_settings(trace, settings);
    if plotter.select_series().is_empty() {
        tracing::warn!(kind = %plotter.measure_kind(), "no measures of the selected kind");
    }
    let figures = plotter.render();
    write_figures(&figures, out)?;
    println!("✓ Wrote {} chart(s) to {}", figures.len(), out.display());
    Ok(())
}

fn cmd_fpt(session: &SessionConfig, replay: &Path, predicate: &str) -> AppResult<()> {
    let result = client(session, replay)?.first_passage_time(&session.simulation, predicate)?;
    print!("{}", result);
    print_reading(&result);
    Ok(())
}

fn cmd_reach(session: &SessionConfig, replay: &Path, query: &ReachabilityQuery) -> AppResult<()> {
    let result = client(session, replay)?.reachability(&session.simulation, query)?;
    print!("{}", result);
    print_reading(&result);
    Ok(())
}
