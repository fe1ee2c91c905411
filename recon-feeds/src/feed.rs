use async_trait::async_trait;
use chrono::NaiveDate;
use recon_core::{ReconError, Trade};

/// Outcome of one [`FeedAdapter::fetch`] call: the canonical trades it produced plus any
/// per-row warnings accumulated along the way. A non-empty `warnings` list is not an error —
/// the feed still returns `Ok`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FetchResult {
    pub trades: Vec<Trade>,
    pub warnings: Vec<String>,
}

/// One source of trades for a given trading day. Implementations are stateless and idempotent:
/// calling `fetch` twice with the same `trade_date` against unchanged source data produces the
/// same trades in the same order.
#[async_trait]
pub trait FeedAdapter: Send + Sync {
    /// Short, stable identifier used in log lines and in `FeedIOError` messages.
    fn source_tag(&self) -> &str;

    async fn fetch(&self, trade_date: NaiveDate) -> Result<FetchResult, ReconError>;
}
