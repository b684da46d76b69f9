// Performance metrics module
//
// Lightweight counters for preview computation, rename runs and state traffic

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Session performance metrics
///
/// Uses atomic operations so the counters can be shared through an `Arc` without
/// locking. Logged as a summary when the program exits.
#[derive(Debug)]
pub struct Metrics {
    /// Number of previews recomputed
    pub previews_computed: AtomicU64,

    /// Total preview computation time in microseconds
    pub total_preview_time_us: AtomicU64,

    /// Files successfully renamed
    pub files_renamed: AtomicUsize,

    /// Files whose rename failed
    pub files_failed: AtomicUsize,

    /// Files skipped by the plan or by cancellation
    pub files_skipped: AtomicUsize,

    /// Number of state updates performed
    pub state_updates: AtomicU64,

    /// Number of change events delivered to at least one subscriber
    pub state_broadcasts: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            previews_computed: AtomicU64::new(0),
            total_preview_time_us: AtomicU64::new(0),
            files_renamed: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
            files_skipped: AtomicUsize::new(0),
            state_updates: AtomicU64::new(0),
            state_broadcasts: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one preview computation and how long it took
    pub fn record_preview(&self, duration: Duration) {
        self.previews_computed.fetch_add(1, Ordering::Relaxed);
        self.total_preview_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_file_renamed(&self) {
        self.files_renamed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_state_update(&self) {
        self.state_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_state_broadcast(&self) {
        self.state_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average preview computation time in microseconds
    pub fn avg_preview_time_us(&self) -> f64 {
        let total = self.total_preview_time_us.load(Ordering::Relaxed);
        let count = self.previews_computed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Previews: {} computed (avg: {:.1}us)",
            self.previews_computed.load(Ordering::Relaxed),
            self.avg_preview_time_us()
        );
        tracing::info!(
            "Files: {} renamed, {} failed, {} skipped",
            self.files_renamed.load(Ordering::Relaxed),
            self.files_failed.load(Ordering::Relaxed),
            self.files_skipped.load(Ordering::Relaxed)
        );
        tracing::info!(
            "State updates: {}, broadcasts: {}",
            self.state_updates.load(Ordering::Relaxed),
            self.state_broadcasts.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
