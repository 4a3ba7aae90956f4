use thiserror::Error;

/// Application-level error type shared by the batch pipeline.
/// Per-unit analysis failures never surface here — the retry orchestrator
/// degrades them to stub records. `AppError` covers the configuration- and
/// job-level failures that abort a single job.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Aggregation job error: {0}")]
    Job(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
