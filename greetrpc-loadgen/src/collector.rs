use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One completed call: how long it took and whether it succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub latency: Duration,
    pub succeeded: bool,
}

/// Thread-safe accumulator of per-call latency observations.
///
/// Any number of call tasks may `record` concurrently; the critical section
/// is a single vector push. `drain` is the sole read/reset boundary and must
/// only run after all producers have finished — the driver's join barrier
/// enforces that, not this type.
#[derive(Debug, Default)]
pub struct SampleCollector {
    samples: Mutex<Vec<Observation>>,
    failed: AtomicU64,
}

impl SampleCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation. Never fails; never blocks beyond the push.
    pub fn record(&self, latency: Duration, succeeded: bool) {
        if !succeeded {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        // A poisoned lock means a recorder panicked mid-push; the vector is
        // still usable, so recording stays infallible.
        let mut samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        samples.push(Observation { latency, succeeded });
    }

    /// Number of observations recorded so far.
    pub fn recorded_count(&self) -> usize {
        self.samples.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Failed observations recorded so far.
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Return every observation and reset the collector to empty.
    pub fn drain(&self) -> Vec<Observation> {
        let mut samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        self.failed.store(0, Ordering::Relaxed);
        std::mem::take(&mut *samples)
    }
}
