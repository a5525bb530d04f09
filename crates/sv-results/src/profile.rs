//! Profiler measurements attached to results after the producing call.

use std::fmt;

use serde::{Deserialize, Serialize};

/// CPU time and memory growth of the call that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilerReading {
    /// Seconds of process CPU time spent by the call.
    pub time_elapsed: f64,
    /// Peak minus trough resident memory during the call, in MiB.
    pub memory_used: f64,
}

impl ProfilerReading {
    pub fn new(time_elapsed: f64, memory_used: f64) -> Self {
        Self {
            time_elapsed,
            memory_used,
        }
    }
}

impl fmt::Display for ProfilerReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "time elapsed : {:.3} s - memory used : {:.3} MiB",
            self.time_elapsed, self.memory_used
        )
    }
}

/// A result that carries a profiler reading slot.
///
/// Setting the reading twice overwrites the previous value.
pub trait Profiled {
    fn set_profiler_reading(&mut self, reading: ProfilerReading);

    fn profiler_reading(&self) -> Option<&ProfilerReading>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_compact() {
        let r = ProfilerReading::new(1.5, 12.25);
        assert_eq!(r.to_string(), "time elapsed : 1.500 s - memory used : 12.250 MiB");
    }
}
