use thiserror::Error;

/// Error taxonomy shared across the reconciliation pipeline.
///
/// `FeedIo` on an external feed, `ParseWarning` and `RuleEvaluation` are all recovered locally
/// by the component that raised them and never reach the orchestrator as an `Err`.
/// `Persistence`, a `FeedIo` on the internal feed, `AlreadyRun` and `Cancelled` propagate to the
/// caller and end the run.
#[derive(Debug, Error)]
pub enum ReconError {
    #[error("feed I/O failure for source {feed_source}: {message}")]
    FeedIo { feed_source: String, message: String },

    #[error("parse warning for row {row}: {message}")]
    ParseWarning { row: String, message: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("a non-failed reconciliation run already exists for {trade_date}")]
    AlreadyRun { trade_date: chrono::NaiveDate },

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("rule evaluation for rule {rule} raised: {message}")]
    RuleEvaluation { rule: String, message: String },

    #[error("run cancelled")]
    Cancelled,
}
