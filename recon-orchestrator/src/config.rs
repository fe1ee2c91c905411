use serde::{Deserialize, Serialize};

/// Tunables for the ingestion fan-out and the orchestrator's rerun policy.
/// `#[serde(deny_unknown_fields)]` rejects an unrecognised configuration key rather than
/// silently ignoring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct OrchestratorConfig {
    /// Bound on concurrently in-flight external feed fetches.
    pub ingest_worker_pool_size: usize,
    /// Per-feed fetch timeout. A timeout on an external feed is recorded as a feed failure; a
    /// timeout on the internal feed ends the run.
    pub feed_timeout_seconds: u64,
    /// Permits superseding a non-failed run for the same trade date instead of rejecting it
    /// with `ReconciliationAlreadyRun`.
    pub force_rerun: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            ingest_worker_pool_size: 5,
            feed_timeout_seconds: 300,
            force_rerun: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_fields() {
        let raw = r#"{ "ingest_worker_pool_size": 3, "bogus_key": 1 }"#;
        let result: Result<OrchestratorConfig, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn default_matches_documented_values() {
        let cfg = OrchestratorConfig::default();
        assert_eq!(cfg.ingest_worker_pool_size, 5);
        assert_eq!(cfg.feed_timeout_seconds, 300);
        assert!(!cfg.force_rerun);
    }
}
