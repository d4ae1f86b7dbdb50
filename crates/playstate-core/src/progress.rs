use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

/// Periodic progress lines and a final summary for long item loops
pub struct ProgressTracker {
    operation: String,
    total: Option<usize>,
    succeeded: usize,
    skipped: usize,
    failed: usize,
    start_time: Instant,
    progress_interval: usize,
    last_progress_log: usize,
    error_counts: HashMap<String, usize>,
}

impl ProgressTracker {
    /// `total` may be unknown until the first page of an enumeration arrives
    pub fn new(operation: &str, total: Option<usize>, progress_interval: usize) -> Self {
        Self {
            operation: operation.to_string(),
            total,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            start_time: Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    pub fn set_total(&mut self, total: usize) {
        if self.total.is_none() {
            info!("{}: {} items to process", self.operation, total);
        }
        self.total = Some(total);
    }

    pub fn record_succeeded(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Failures are grouped by category in the summary
    pub fn record_failed(&mut self, category: &str) {
        self.failed += 1;
        *self.error_counts.entry(category.to_string()).or_insert(0) += 1;
    }

    pub fn processed(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    pub fn log_progress(&mut self) {
        let current = self.processed();
        let at_end = self.total.map(|t| current >= t).unwrap_or(false);
        if current - self.last_progress_log < self.progress_interval && !at_end {
            return;
        }
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { current as f64 / elapsed } else { 0.0 };
        let total = self.total.map(|t| t.to_string()).unwrap_or_else(|| "?".to_string());
        info!(
            "{} progress: {}/{} ({:.1} items/sec) | Succeeded: {} | Skipped: {} | Failed: {}",
            self.operation, current, total, rate, self.succeeded, self.skipped, self.failed
        );
        self.last_progress_log = current;
    }

    pub fn log_summary(&self) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if self.failed == 0 {
            info!(
                "{} completed: {} items in {:.1}s | Succeeded: {} | Skipped: {} | Failed: 0",
                self.operation,
                self.processed(),
                elapsed,
                self.succeeded,
                self.skipped
            );
            return;
        }

        warn!(
            "{} completed: {} items in {:.1}s | Succeeded: {} | Skipped: {} | Failed: {}",
            self.operation,
            self.processed(),
            elapsed,
            self.succeeded,
            self.skipped,
            self.failed
        );
        let mut entries: Vec<_> = self.error_counts.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let breakdown: Vec<String> = entries
            .iter()
            .map(|(category, count)| format!("{}: {}", category, count))
            .collect();
        info!("Error breakdown: {}", breakdown.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut tracker = ProgressTracker::new("Backup", None, 10);
        tracker.set_total(4);
        tracker.record_succeeded();
        tracker.record_succeeded();
        tracker.record_skipped();
        tracker.record_failed("HTTP 500");
        tracker.log_progress();
        assert_eq!(tracker.processed(), 4);
        assert_eq!(tracker.last_progress_log, 4);
        assert_eq!(tracker.error_counts["HTTP 500"], 1);
    }
}
