use crate::feed::{FeedAdapter, FetchResult};
use crate::normalizer::normalize;
use async_trait::async_trait;
use chrono::NaiveDate;
use recon_core::{ReconError, TradeSource};
use std::collections::BTreeMap;

/// Executes a parameterized query against the internal trading platform. `trade_date` is passed
/// as a typed argument, never formatted into query text — the source of the "no string
/// concatenation" requirement on this adapter.
#[async_trait]
pub trait InternalQuerySource: Send + Sync {
    async fn query(&self, trade_date: NaiveDate) -> Result<Vec<BTreeMap<String, String>>, ReconError>;
}

pub struct InternalQueryAdapter {
    source: Box<dyn InternalQuerySource>,
}

impl InternalQueryAdapter {
    pub fn new(source: Box<dyn InternalQuerySource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl FeedAdapter for InternalQueryAdapter {
    fn source_tag(&self) -> &str {
        "internal"
    }

    async fn fetch(&self, trade_date: NaiveDate) -> Result<FetchResult, ReconError> {
        let rows = self.source.query(trade_date).await?;
        let mut result = FetchResult::default();

        for row in rows {
            match normalize(&row, TradeSource::Internal) {
                Ok(outcome) => {
                    result.warnings.extend(outcome.warnings);
                    result.trades.push(outcome.trade);
                }
                Err(error) => result.warnings.push(error.to_string()),
            }
        }

        Ok(result)
    }
}
