use crate::feed::{FeedAdapter, FetchResult};
use crate::normalizer::normalize;
use async_trait::async_trait;
use chrono::NaiveDate;
use recon_core::{ReconError, TradeSource};
use std::collections::BTreeMap;

/// Fixed tag-to-field dictionary for the pipe-delimited `tag=value` protocol, grounded on the
/// field numbering of a typical FIX execution report.
const TAG_MAP: &[(&str, &str)] = &[
    ("11", "trade_id"),
    ("55", "instrument_id"),
    ("15", "currency"),
    ("31", "price"),
    ("32", "quantity"),
    ("60", "trade_date"),
    ("64", "settlement_date"),
    ("76", "counterparty"),
    ("1", "account"),
];

fn canonical_field_for_tag(tag: &str) -> Option<&'static str> {
    TAG_MAP.iter().find(|(known_tag, _)| *known_tag == tag).map(|(_, field)| *field)
}

/// Parses one message per line, fields joined by `delimiter` (pipe by default) as `tag=value`
/// pairs. Tags outside [`TAG_MAP`] are retained under `tag_<n>` rather than discarded, so an
/// unmapped field is still auditable in `raw_data`.
pub struct TagValueAdapter {
    source_tag: String,
    content: String,
    delimiter: char,
    source: TradeSource,
}

impl TagValueAdapter {
    pub fn new(source_tag: impl Into<String>, content: impl Into<String>, delimiter: char, source: TradeSource) -> Self {
        Self {
            source_tag: source_tag.into(),
            content: content.into(),
            delimiter,
            source,
        }
    }

    fn parse_line(&self, line: &str) -> BTreeMap<String, String> {
        let mut raw = BTreeMap::new();
        for field in line.split(self.delimiter) {
            let Some((tag, value)) = field.split_once('=') else {
                continue;
            };
            let key = canonical_field_for_tag(tag)
                .map(str::to_string)
                .unwrap_or_else(|| format!("tag_{tag}"));
            raw.insert(key, value.to_string());
        }
        raw
    }
}

#[async_trait]
impl FeedAdapter for TagValueAdapter {
    fn source_tag(&self) -> &str {
        &self.source_tag
    }

    async fn fetch(&self, _trade_date: NaiveDate) -> Result<FetchResult, ReconError> {
        let mut result = FetchResult::default();

        for (line_number, line) in self.content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let raw = self.parse_line(line);
            match normalize(&raw, self.source.clone()) {
                Ok(outcome) => {
                    result.warnings.extend(outcome.warnings);
                    result.trades.push(outcome.trade);
                }
                Err(error) => result.warnings.push(format!("line {}: {error}", line_number + 1)),
            }
        }

        Ok(result)
    }
}
