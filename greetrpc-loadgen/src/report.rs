use std::time::Duration;

use crate::collector::Observation;

/// Latency percentile summary for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PercentileReport {
    pub total_count: u64,
    pub failed_count: u64,
    pub p50: Duration,
    pub p90: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub p999: Duration,
    pub max: Duration,
}

impl PercentileReport {
    /// Summarize a drained sample set. An empty set yields the all-zero
    /// report; that is defined behavior, not an error.
    ///
    /// Percentile selection is nearest-rank without interpolation: latencies
    /// are sorted ascending and the value at index `count * p / 100 - 1`
    /// (integer arithmetic, clamped to the valid range) is taken. The result
    /// is deterministic for a given multiset regardless of insertion order.
    pub fn compute(observations: &[Observation]) -> PercentileReport {
        let total_count = observations.len() as u64;
        let failed_count = observations.iter().filter(|o| !o.succeeded).count() as u64;

        let mut latencies: Vec<Duration> = observations.iter().map(|o| o.latency).collect();
        latencies.sort_unstable();

        PercentileReport {
            total_count,
            failed_count,
            p50: nearest_rank(&latencies, 50, 100),
            p90: nearest_rank(&latencies, 90, 100),
            p95: nearest_rank(&latencies, 95, 100),
            p99: nearest_rank(&latencies, 99, 100),
            p999: nearest_rank(&latencies, 999, 1_000),
            max: latencies.last().copied().unwrap_or(Duration::ZERO),
        }
    }
}

/// Select the `numerator/denominator` percentile from `sorted` by nearest
/// rank: index `count * numerator / denominator - 1`, clamped to
/// `[0, count-1]`. Small counts at high percentiles can land below the
/// maximum; that behavior is intentional and kept as-is.
fn nearest_rank(sorted: &[Duration], numerator: usize, denominator: usize) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let index = (sorted.len() * numerator / denominator)
        .saturating_sub(1)
        .min(sorted.len() - 1);
    sorted[index]
}
