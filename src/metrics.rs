//! Stage counters for the preparation run.
//!
//! Recorded through the `metrics` facade. Nothing here installs a recorder;
//! an embedding process that wants them exported installs its own.

use metrics::{counter, histogram};
use std::fmt;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    DocumentsFetched,
    DocumentsSkipped,
    RowsLoaded,
    RowsTextCoerced,
    RowsKeptByThreadFilter,
    RowsDroppedUnrelated,
    RowsDroppedMisdirected,
    RowsNormalized,
    RowsDefaulted,
    RowsDroppedLanguage,
    RowsPerView,
    CheckpointsWritten,
    CheckpointBytes,
    StageDuration,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricName::DocumentsFetched => "prep_documents_fetched_total",
            MetricName::DocumentsSkipped => "prep_documents_skipped_total",
            MetricName::RowsLoaded => "prep_rows_loaded_total",
            MetricName::RowsTextCoerced => "prep_rows_text_coerced_total",
            MetricName::RowsKeptByThreadFilter => "prep_rows_thread_kept_total",
            MetricName::RowsDroppedUnrelated => "prep_rows_dropped_unrelated_total",
            MetricName::RowsDroppedMisdirected => "prep_rows_dropped_misdirected_total",
            MetricName::RowsNormalized => "prep_rows_normalized_total",
            MetricName::RowsDefaulted => "prep_rows_defaulted_total",
            MetricName::RowsDroppedLanguage => "prep_rows_dropped_language_total",
            MetricName::RowsPerView => "prep_view_rows_total",
            MetricName::CheckpointsWritten => "prep_checkpoints_written_total",
            MetricName::CheckpointBytes => "prep_checkpoint_bytes_total",
            MetricName::StageDuration => "prep_stage_duration_seconds",
        };
        write!(f, "{}", name)
    }
}

pub fn increment(metric: MetricName, value: usize) {
    counter!(metric.to_string()).increment(value as u64);
}

pub fn view_rows(view: &'static str, rows: usize) {
    counter!(MetricName::RowsPerView.to_string(), "view" => view).increment(rows as u64);
}

pub fn checkpoint_written(name: &str, bytes: u64) {
    counter!(MetricName::CheckpointsWritten.to_string(), "checkpoint" => name.to_string())
        .increment(1);
    counter!(MetricName::CheckpointBytes.to_string(), "checkpoint" => name.to_string())
        .increment(bytes);
}

/// Records the elapsed stage time when dropped
pub struct StageTimer {
    start: Instant,
    stage: &'static str,
}

impl StageTimer {
    pub fn start(stage: &'static str) -> Self {
        Self {
            start: Instant::now(),
            stage,
        }
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        let secs = self.start.elapsed().as_secs_f64();
        histogram!(MetricName::StageDuration.to_string(), "stage" => self.stage).record(secs);
    }
}
