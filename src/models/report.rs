use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ScanResult, Severity};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanStats {
    pub elapsed_secs: f64,
    pub requests_per_second: f64,
    pub processed: usize,
    pub filtered: usize,
    pub rejected: usize,
    pub total: Option<usize>,
}

impl ScanStats {
    pub fn new(total: Option<usize>) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, admitted: bool) {
        self.processed += 1;
        if admitted {
            self.filtered += 1;
        } else {
            self.rejected += 1;
        }
    }

    /// Updates elapsed time and throughput, rounded to two decimals.
    pub fn finish_tick(&mut self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        self.elapsed_secs = secs;
        self.requests_per_second = if secs > 0.0 {
            round2(self.processed as f64 / secs)
        } else {
            0.0
        };
    }

    /// Fraction of the enumeration done, `None` when the total is unbounded.
    pub fn progress(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some(self.processed as f64 / total as f64),
            None => None,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Admitted results in completion order plus run statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub results: Vec<ScanResult>,
    pub stats: ScanStats,
}

impl ScanReport {
    pub fn new(total: Option<usize>) -> Self {
        Self {
            results: Vec::new(),
            stats: ScanStats::new(total),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub total: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    pub info_count: usize,
    pub unknown_count: usize,
    pub error_count: usize,
}

impl SeveritySummary {
    pub fn from_results(results: &[ScanResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };

        for result in results {
            match result.severity {
                Severity::High => summary.high_count += 1,
                Severity::Medium => summary.medium_count += 1,
                Severity::Low => summary.low_count += 1,
                Severity::Info => summary.info_count += 1,
                Severity::Unknown => summary.unknown_count += 1,
            }
            if result.error {
                summary.error_count += 1;
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_counts_consistent() {
        let mut stats = ScanStats::new(Some(3));
        stats.record(true);
        stats.record(false);
        stats.record(true);
        assert_eq!(stats.processed, 3);
        assert_eq!(stats.filtered, 2);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.progress(), Some(1.0));
    }

    #[test]
    fn test_unbounded_progress() {
        let mut stats = ScanStats::new(None);
        stats.record(true);
        assert_eq!(stats.progress(), None);
    }

    #[test]
    fn test_throughput_rounding() {
        let mut stats = ScanStats::new(None);
        for _ in 0..10 {
            stats.record(true);
        }
        stats.finish_tick(Duration::from_secs(3));
        assert_eq!(stats.requests_per_second, 3.33);
        stats.finish_tick(Duration::ZERO);
        assert_eq!(stats.requests_per_second, 0.0);
    }
}
