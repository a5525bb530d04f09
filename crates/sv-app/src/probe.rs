//! Process resource probes and the background memory sampler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const PAGE_SIZE: u64 = 4096;
/// `USER_HZ` on every mainstream Linux target; used when auxv is unreadable.
const FALLBACK_CLOCK_TICKS: u64 = 100;
/// Auxiliary vector tag carrying the kernel's `USER_HZ`.
const AT_CLKTCK: usize = 17;

/// Resident set size of this process, where the platform exposes it.
pub fn current_rss_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let raw = std::fs::read_to_string("/proc/self/statm").ok()?;
        let pages: u64 = raw.split_whitespace().nth(1)?.parse().ok()?;
        Some(pages.saturating_mul(PAGE_SIZE))
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// User plus system CPU time consumed by this process, in seconds.
pub fn process_cpu_seconds() -> Option<f64> {
    read_cpu_seconds("/proc/self/stat")
}

/// User plus system CPU time consumed by the calling thread, in seconds.
pub fn thread_cpu_seconds() -> Option<f64> {
    read_cpu_seconds("/proc/thread-self/stat")
}

#[cfg(target_os = "linux")]
fn read_cpu_seconds(path: &str) -> Option<f64> {
    let raw = std::fs::read_to_string(path).ok()?;
    parse_cpu_seconds(&raw, clock_ticks_per_sec())
}

#[cfg(not(target_os = "linux"))]
fn read_cpu_seconds(_path: &str) -> Option<f64> {
    None
}

/// Kernel clock ticks per second, as reported in the process's auxv.
pub fn clock_ticks_per_sec() -> u64 {
    static TICKS: OnceLock<u64> = OnceLock::new();
    *TICKS.get_or_init(|| {
        std::fs::read("/proc/self/auxv")
            .ok()
            .and_then(|raw| parse_auxv_clock_ticks(&raw))
            .unwrap_or(FALLBACK_CLOCK_TICKS)
    })
}

/// Finds `AT_CLKTCK` in a native-endian sequence of `(tag, value)` words.
fn parse_auxv_clock_ticks(raw: &[u8]) -> Option<u64> {
    const WORD: usize = std::mem::size_of::<usize>();
    let word = |chunk: &[u8]| -> Option<usize> { Some(usize::from_ne_bytes(chunk.try_into().ok()?)) };
    raw.chunks_exact(2 * WORD)
        .filter_map(|pair| Some((word(&pair[..WORD])?, word(&pair[WORD..])?)))
        .take_while(|&(tag, _)| tag != 0)
        .find(|&(tag, _)| tag == AT_CLKTCK)
        .map(|(_, ticks)| ticks as u64)
        .filter(|&ticks| ticks > 0)
}

/// Reads utime and stime (fields 14 and 15) out of a `/proc/<pid>/stat` line.
fn parse_cpu_seconds(stat: &str, ticks_per_sec: u64) -> Option<f64> {
    // the command name may itself contain spaces and parentheses
    let rest = &stat[stat.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;
    Some((utime + stime) as f64 / ticks_per_sec.max(1) as f64)
}

/// Smallest and largest RSS seen while sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryBounds {
    pub min_bytes: Option<u64>,
    pub max_bytes: Option<u64>,
    pub samples: usize,
}

impl MemoryBounds {
    pub fn observe(&mut self, bytes: u64) {
        self.min_bytes = Some(self.min_bytes.map_or(bytes, |m| m.min(bytes)));
        self.max_bytes = Some(self.max_bytes.map_or(bytes, |m| m.max(bytes)));
        self.samples += 1;
    }
}

/// Samples RSS on its own thread until stopped.
pub struct MemorySampler {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<MemoryBounds>,
}

impl MemorySampler {
    pub fn start(interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let mut bounds = MemoryBounds::default();
            loop {
                if let Some(bytes) = current_rss_bytes() {
                    bounds.observe(bytes);
                }
                if flag.load(Ordering::Acquire) {
                    break;
                }
                thread::sleep(interval);
            }
            bounds
        });
        Self { stop, handle }
    }

    /// Stops sampling and returns what was observed, including one final
    /// sample taken after the stop request.
    pub fn finish(self) -> MemoryBounds {
        self.stop.store(true, Ordering::Release);
        self.handle.join().unwrap_or_else(|_| {
            tracing::warn!("memory sampler thread panicked");
            MemoryBounds::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stat_line_with_odd_command_name() {
        let stat = "1234 (sv (cli) x) S 1 2 3 4 5 6 7 8 9 10 250 50 0 0 20 0 1 0";
        assert_eq!(parse_cpu_seconds(stat, 100), Some(3.0));
        assert_eq!(parse_cpu_seconds(stat, 250), Some(1.2));
        assert_eq!(parse_cpu_seconds("garbage", 100), None);
    }

    fn auxv(entries: &[(usize, usize)]) -> Vec<u8> {
        entries
            .iter()
            .flat_map(|&(tag, value)| [tag.to_ne_bytes(), value.to_ne_bytes()])
            .flatten()
            .collect()
    }

    #[test]
    fn clock_ticks_come_from_auxv() {
        assert_eq!(parse_auxv_clock_ticks(&auxv(&[(6, 4096), (17, 250), (0, 0)])), Some(250));
        // entries after AT_NULL are ignored
        assert_eq!(parse_auxv_clock_ticks(&auxv(&[(6, 4096), (0, 0), (17, 250)])), None);
        assert_eq!(parse_auxv_clock_ticks(&[]), None);
        assert!(clock_ticks_per_sec() > 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn thread_time_excludes_other_threads() {
        let busy = thread::spawn(|| {
            let start = std::time::Instant::now();
            let mut x = 0u64;
            while start.elapsed() < Duration::from_millis(300) {
                x = x.wrapping_add(std::hint::black_box(1));
            }
            x
        });
        let before = thread_cpu_seconds().unwrap();
        thread::sleep(Duration::from_millis(300));
        let after = thread_cpu_seconds().unwrap();
        busy.join().unwrap();
        assert!(after - before < 0.1, "{}", after - before);
    }

    #[test]
    fn bounds_track_extremes() {
        let mut b = MemoryBounds::default();
        assert_eq!(b.min_bytes, None);
        for v in [30, 10, 20] {
            b.observe(v);
        }
        assert_eq!((b.min_bytes, b.max_bytes, b.samples), (Some(10), Some(30), 3));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn sampler_collects_and_stops() {
        let sampler = MemorySampler::start(Duration::from_millis(1));
        thread::sleep(Duration::from_millis(20));
        let bounds = sampler.finish();
        assert!(bounds.samples >= 1);
        assert!(bounds.min_bytes.unwrap() <= bounds.max_bytes.unwrap());
    }
}
