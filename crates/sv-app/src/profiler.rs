//! Runs one operation at a time while animating progress and measuring it.

use std::any::Any;
use std::fmt;
use std::panic;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use sv_core::{bytes_to_mib, round_to};
use sv_results::{Profiled, ProfilerReading};

use crate::config::ProfilerSettings;
use crate::probe::{self, MemorySampler};
use crate::progress::{
    AnimationStyle, ProgressAnimator, ProgressEvent, ProgressSink, SilentSink, TerminalSink,
};

pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(1);
/// Memory must be sampled more often than this.
pub const MAX_SAMPLE_INTERVAL: Duration = Duration::from_millis(9);

/// Measurements of one profiled operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileReport {
    pub label: String,
    pub started_at: DateTime<Utc>,
    /// CPU time of the worker thread in seconds. Falls back to process CPU
    /// time, then to wall time, where the platform cannot report it.
    pub cpu_time: f64,
    pub wall_time: f64,
    pub min_memory: f64,
    pub max_memory: f64,
    pub succeeded: bool,
}

impl ProfileReport {
    /// Peak minus trough, in MiB.
    pub fn memory_used(&self) -> f64 {
        self.max_memory - self.min_memory
    }

    pub fn reading(&self) -> ProfilerReading {
        ProfilerReading::new(self.cpu_time, self.memory_used())
    }

    pub fn compact(&self) -> String {
        format!(
            "op : {} --- time : {} --- min mem : {} --- max mem : {} --- ",
            self.label,
            round_to(self.cpu_time, 2),
            round_to(self.min_memory, 2),
            round_to(self.max_memory, 2)
        )
    }
}

impl fmt::Display for ProfileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Operation     : {}", self.label)?;
        writeln!(f, "Started at    : {}", self.started_at.to_rfc3339())?;
        writeln!(f, "Time required : {} s", self.cpu_time)?;
        writeln!(f, "Wall time     : {} s", self.wall_time)?;
        writeln!(f, "Memory (min)  : {} MiB", self.min_memory)?;
        writeln!(f, "Memory (max)  : {} MiB", self.max_memory)?;
        writeln!(f, "difference    : {} MiB", self.memory_used())
    }
}

/// An operation's value together with its measurements.
#[derive(Debug)]
pub struct ProfileOutcome<T> {
    pub value: T,
    pub report: ProfileReport,
}

/// Profiles one operation at a time.
///
/// The operation runs on a worker thread. The calling thread draws a
/// progress frame, then waits up to one frame interval for the result, so
/// it is never blocked for longer than that. A sampler thread records RSS
/// for the lifetime of the operation and is joined before returning.
pub struct ProfilingHarness {
    running_message: String,
    done_message: String,
    animator: ProgressAnimator,
    frame_interval: Duration,
    sample_interval: Duration,
    sink: Box<dyn ProgressSink>,
    last_report: Option<ProfileReport>,
}

impl ProfilingHarness {
    pub fn new(running_message: impl Into<String>, done_message: impl Into<String>) -> Self {
        Self {
            running_message: running_message.into(),
            done_message: done_message.into(),
            animator: ProgressAnimator::new(AnimationStyle::Snake),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            sink: Box::new(TerminalSink),
            last_report: None,
        }
    }

    pub fn from_settings(
        settings: &ProfilerSettings,
        running_message: impl Into<String>,
        done_message: impl Into<String>,
    ) -> Self {
        let harness = Self::new(running_message, done_message)
            .with_animation(settings.animation)
            .with_frame_interval(Duration::from_millis(settings.frame_interval_ms))
            .with_sample_interval(Duration::from_millis(settings.sample_interval_ms));
        if settings.silent {
            harness.with_sink(SilentSink)
        } else {
            harness
        }
    }

    pub fn with_sink(self, sink: impl ProgressSink + 'static) -> Self {
        self.with_boxed_sink(Box::new(sink))
    }

    pub fn with_boxed_sink(mut self, sink: Box<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_animation(mut self, style: AnimationStyle) -> Self {
        self.animator.set_style(style);
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Clamped to `MAX_SAMPLE_INTERVAL`.
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval.clamp(Duration::from_millis(1), MAX_SAMPLE_INTERVAL);
        self
    }

    pub fn set_dots_animation(&mut self) {
        self.animator.set_style(AnimationStyle::Dots);
    }

    pub fn set_snake_animation(&mut self) {
        self.animator.set_style(AnimationStyle::Snake);
    }

    pub fn last_report(&self) -> Option<&ProfileReport> {
        self.last_report.as_ref()
    }

    /// Runs `op` and returns its value with the measurements.
    ///
    /// An error from `op` is returned unchanged after the animation has
    /// stopped; its measurements stay available through [`Self::last_report`].
    /// A panic in `op` is resumed on the calling thread once the sampler
    /// has been joined.
    pub fn run<T, E, F>(&mut self, label: &str, op: F) -> Result<ProfileOutcome<T>, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        tracing::debug!(label, "profiling started");
        self.animator.reset();
        let started_at = Utc::now();
        let wall_start = Instant::now();
        let cpu_start = probe::process_cpu_seconds();
        let sampler = MemorySampler::start(self.sample_interval);

        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || {
            let thread_start = probe::thread_cpu_seconds();
            let result = op();
            let thread_cpu = match (thread_start, probe::thread_cpu_seconds()) {
                (Some(start), Some(end)) => Some((end - start).max(0.0)),
                _ => None,
            };
            // the receiver only disappears if the caller itself unwound
            let _ = tx.send((result, thread_cpu));
        });

        let received = loop {
            let frame = self.animator.advance();
            self.sink.emit(&ProgressEvent::Frame {
                message: self.running_message.clone(),
                frame,
            });
            match rx.recv_timeout(self.frame_interval) {
                Ok(result) => break Some(result),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break None,
            }
        };
        let joined = worker.join();
        let bounds = sampler.finish();

        let wall_time = wall_start.elapsed().as_secs_f64();
        let process_cpu = match (cpu_start, probe::process_cpu_seconds()) {
            (Some(start), Some(end)) => Some((end - start).max(0.0)),
            _ => None,
        };
        let thread_cpu = received.as_ref().and_then(|(_, cpu)| *cpu);
        let cpu_time = thread_cpu.or(process_cpu).unwrap_or(wall_time);
        let mib = |bytes: Option<u64>| bytes.map_or(0.0, bytes_to_mib);
        let mut report = ProfileReport {
            label: label.to_string(),
            started_at,
            cpu_time,
            wall_time,
            min_memory: mib(bounds.min_bytes),
            max_memory: mib(bounds.max_bytes),
            succeeded: false,
        };

        let Some((result, _)) = received else {
            self.sink.emit(&ProgressEvent::Finished {
                line: format!("{}: operation panicked", self.failed_prefix()),
            });
            self.last_report = Some(report);
            tracing::error!(label, "profiled operation panicked");
            let payload: Box<dyn Any + Send> = match joined {
                Err(payload) => payload,
                Ok(()) => Box::new("worker exited without a result"),
            };
            panic::resume_unwind(payload);
        };

        match result {
            Ok(value) => {
                report.succeeded = true;
                self.sink.emit(&ProgressEvent::Finished {
                    line: self.done_message.clone(),
                });
                tracing::info!(summary = %report.compact(), "profiled operation finished");
                self.last_report = Some(report.clone());
                Ok(ProfileOutcome { value, report })
            }
            Err(err) => {
                self.sink.emit(&ProgressEvent::Finished {
                    line: format!("{}: {}", self.failed_prefix(), err),
                });
                tracing::warn!(label, error = %err, "profiled operation failed");
                self.last_report = Some(report);
                Err(err)
            }
        }
    }

    /// Like [`Self::run`], attaching the reading to the returned value.
    pub fn execute<T, E, F>(&mut self, label: &str, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Profiled + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let ProfileOutcome { mut value, report } = self.run(label, op)?;
        value.set_profiler_reading(report.reading());
        Ok(value)
    }

    fn failed_prefix(&self) -> String {
        format!("{} failed", self.running_message)
    }
}

impl fmt::Display for ProfilingHarness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last_report {
            Some(report) => write!(f, "{}", report),
            None => write!(f, "No operation has been profiled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ProfileReport {
        ProfileReport {
            label: "simulate".into(),
            started_at: Utc::now(),
            cpu_time: 1.23456,
            wall_time: 2.0,
            min_memory: 10.0,
            max_memory: 12.5,
            succeeded: true,
        }
    }

    #[test]
    fn report_views() {
        let r = report();
        assert_eq!(r.memory_used(), 2.5);
        assert_eq!(
            r.compact(),
            "op : simulate --- time : 1.23 --- min mem : 10 --- max mem : 12.5 --- "
        );
        let long = r.to_string();
        assert!(long.contains("Time required : 1.23456 s"));
        assert!(long.contains("difference    : 2.5 MiB"));
        assert_eq!(r.reading(), ProfilerReading::new(1.23456, 2.5));
    }

    #[test]
    fn fresh_harness_has_nothing_to_report() {
        let h = ProfilingHarness::new("Running", "Done");
        assert_eq!(h.to_string(), "No operation has been profiled");
    }

    #[test]
    fn sample_interval_stays_below_ten_ms() {
        let h = ProfilingHarness::new("r", "d").with_sample_interval(Duration::from_millis(50));
        assert_eq!(h.sample_interval, MAX_SAMPLE_INTERVAL);
    }
}
