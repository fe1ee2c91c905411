use recon_core::TradeSource;
use recon_match::MatchConfig;
use recon_orchestrator::OrchestratorConfig;
use recon_resolve::AliasTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_delimiter() -> char {
    ','
}

/// A feed backed by a file on disk, read once per run. Real deployments may point `path` at a
/// location a scheduled export job refreshes before this binary runs; the orchestrator itself
/// never re-reads a file mid-run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DelimitedFeedConfig {
    pub source_tag: String,
    pub path: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    pub column_mapping: BTreeMap<String, String>,
}

impl Default for DelimitedFeedConfig {
    fn default() -> Self {
        Self {
            source_tag: "internal".to_string(),
            path: PathBuf::new(),
            delimiter: default_delimiter(),
            column_mapping: BTreeMap::new(),
        }
    }
}

/// One configured external feed. `kind` picks the wire format; every variant names the
/// [`TradeSource`] its rows are tagged with once normalized.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ExternalFeedConfig {
    DelimitedText {
        source_tag: String,
        path: PathBuf,
        #[serde(default = "default_delimiter")]
        delimiter: char,
        #[serde(default)]
        column_mapping: BTreeMap<String, String>,
        trade_source: TradeSource,
    },
    TagValue {
        source_tag: String,
        path: PathBuf,
        #[serde(default = "default_delimiter")]
        delimiter: char,
        trade_source: TradeSource,
    },
}

/// Top-level configuration composing every per-crate config plus logging and feed wiring.
/// Rejects unknown keys at every nesting level so a typo in an operator's TOML file fails fast
/// rather than silently running with a default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReconConfig {
    pub matching: MatchConfig,
    pub orchestrator: OrchestratorConfig,
    pub internal_feed: DelimitedFeedConfig,
    pub external_feeds: Vec<ExternalFeedConfig>,
    /// Groups of counterparty names treated as aliases of one another, e.g.
    /// `[["JPMORGAN CHASE", "JPM"]]`.
    pub counterparty_aliases: Vec<Vec<String>>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            matching: MatchConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            internal_feed: DelimitedFeedConfig::default(),
            external_feeds: Vec::new(),
            counterparty_aliases: Vec::new(),
            log_filter: default_log_filter(),
        }
    }
}

impl ReconConfig {
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn alias_table(&self) -> AliasTable {
        let mut table = AliasTable::default();
        for group in &self.counterparty_aliases {
            for pair in group.windows(2) {
                table.insert(&pair[0], &pair[1]);
            }
            if let [first, rest @ ..] = group.as_slice() {
                for other in rest {
                    table.insert(first, other);
                }
            }
        }
        table
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_top_level_field() {
        let raw = "bogus_key = 1\n";
        let result: Result<ReconConfig, _> = toml::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn default_log_filter_is_info() {
        assert_eq!(ReconConfig::default().log_filter, "info");
    }

    #[test]
    fn alias_table_links_every_name_in_a_group() {
        let config = ReconConfig {
            counterparty_aliases: vec![vec![
                "JPMORGAN CHASE".to_string(),
                "JPM".to_string(),
                "J.P. MORGAN".to_string(),
            ]],
            ..ReconConfig::default()
        };
        let table = config.alias_table();
        assert!(table.are_aliases("JPM", "J.P. MORGAN"));
        assert!(table.are_aliases("JPMORGAN CHASE", "J.P. MORGAN"));
    }

    #[test]
    fn parses_a_minimal_external_feed_entry() {
        let raw = r#"
            [[external_feeds]]
            kind = "delimited_text"
            source_tag = "broker_a_csv"
            path = "broker_a.csv"
            trade_source = "broker_a"
        "#;
        let config: ReconConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.external_feeds.len(), 1);
    }
}
