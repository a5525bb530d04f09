use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{self, JoinHandle};

use sv_app::{AppResult, ReplayEngine, RuntimeClient, SessionConfig};
use sv_results::SimulationTraceResult;

pub struct SimulationWorker {
    pub rx: Receiver<WorkerMessage>,
    _handle: JoinHandle<()>,
}

pub enum WorkerMessage {
    Complete { trace: SimulationTraceResult },
    Error { message: String },
}

impl SimulationWorker {
    /// Runs a replayed simulation off the UI thread. Progress output is
    /// silenced; the viewer shows its own spinner.
    pub fn start(replay: &Path, label: &str, session: &SessionConfig) -> Self {
        let (tx, rx) = channel();
        let replay = replay.to_path_buf();
        let label = label.to_string();
        let mut session = session.clone();
        session.profiler.silent = true;

        let handle = thread::spawn(move || {
            if let Err(e) = Self::run(&replay, &label, &session, &tx) {
                tracing::warn!(error = %e, "simulation worker failed");
                let _ = tx.send(WorkerMessage::Error {
                    message: format!("Simulation failed: {}", e),
                });
            }
        });

        Self {
            rx,
            _handle: handle,
        }
    }

    fn run(
        replay: &Path,
        label: &str,
        session: &SessionConfig,
        tx: &Sender<WorkerMessage>,
    ) -> AppResult<()> {
        let engine = ReplayEngine::from_path(replay)?;
        let client =
            RuntimeClient::new(Arc::new(engine)).with_profiler(session.profiler.clone());
        let trace = client.simulate(&session.simulation, label)?;
        let _ = tx.send(WorkerMessage::Complete { trace });
        Ok(())
    }
}
