use crate::feed::{FeedAdapter, FetchResult};
use crate::normalizer::normalize;
use async_trait::async_trait;
use chrono::NaiveDate;
use recon_core::{ReconError, TradeSource};
use std::collections::{BTreeMap, HashMap};

/// Parses a delimited-text feed already read into memory. Per-row parse failures accumulate as
/// warnings rather than aborting the rest of the file.
pub struct DelimitedTextAdapter {
    source_tag: String,
    content: String,
    delimiter: char,
    column_mapping: HashMap<String, String>,
    source: TradeSource,
}

impl DelimitedTextAdapter {
    pub fn new(
        source_tag: impl Into<String>,
        content: impl Into<String>,
        delimiter: char,
        column_mapping: HashMap<String, String>,
        source: TradeSource,
    ) -> Self {
        Self {
            source_tag: source_tag.into(),
            content: content.into(),
            delimiter,
            column_mapping,
            source,
        }
    }

    fn canonical_field(&self, header: &str) -> String {
        self.column_mapping.get(header).cloned().unwrap_or_else(|| header.to_string())
    }
}

#[async_trait]
impl FeedAdapter for DelimitedTextAdapter {
    fn source_tag(&self) -> &str {
        &self.source_tag
    }

    async fn fetch(&self, _trade_date: NaiveDate) -> Result<FetchResult, ReconError> {
        let mut lines = self.content.lines();
        let header_line = lines.next().ok_or_else(|| ReconError::FeedIo {
            feed_source: self.source_tag.clone(),
            message: "file has no header row".to_string(),
        })?;
        let headers: Vec<String> = header_line.split(self.delimiter).map(|h| self.canonical_field(h)).collect();

        let mut result = FetchResult::default();
        for (row_number, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(self.delimiter).collect();
            let raw: BTreeMap<String, String> = headers
                .iter()
                .cloned()
                .zip(fields.iter().map(|f| f.to_string()))
                .collect();

            match normalize(&raw, self.source.clone()) {
                Ok(outcome) => {
                    result.warnings.extend(outcome.warnings);
                    result.trades.push(outcome.trade);
                }
                Err(error) => result.warnings.push(format!("row {}: {error}", row_number + 2)),
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_rows_with_column_mapping() {
        let mut mapping = HashMap::new();
        mapping.insert("ID".to_string(), "trade_id".to_string());
        mapping.insert("Qty".to_string(), "quantity".to_string());
        mapping.insert("Px".to_string(), "price".to_string());
        mapping.insert("When".to_string(), "trade_date".to_string());

        let content = "ID,Qty,Px,When\nT1,100,10.00,2024-01-05 09:00:00\n";
        let adapter = DelimitedTextAdapter::new(
            "broker_a_csv",
            content,
            ',',
            mapping,
            TradeSource::BrokerA,
        );

        let result = adapter.fetch(chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()).await.unwrap();
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].trade_id.0.as_str(), "T1");
    }

    #[tokio::test]
    async fn bad_row_does_not_abort_the_feed() {
        let content = "trade_id,trade_date\nT1,2024-01-05 09:00:00\nT2,not-a-date\nT3,2024-01-06 09:00:00\n";
        let adapter = DelimitedTextAdapter::new(
            "broker_a_csv",
            content,
            ',',
            HashMap::new(),
            TradeSource::BrokerA,
        );

        let result = adapter.fetch(chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()).await.unwrap();
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.warnings.len(), 1);
    }
}
