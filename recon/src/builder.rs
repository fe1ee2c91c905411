use crate::config::{ExternalFeedConfig, ReconConfig};
use recon_feeds::{DelimitedTextAdapter, FeedAdapter, TagValueAdapter};
use recon_match::MatchingEngine;
use recon_orchestrator::{InMemoryCollaborator, Orchestrator, WorkflowCollaborator};
use recon_resolve::AutoResolver;
use recon_storage::{InMemoryStorage, Storage};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to read feed file {path}: {source}")]
    FeedFile { path: String, source: std::io::Error },
}

fn read_feed_file(path: &Path) -> Result<String, BuildError> {
    std::fs::read_to_string(path).map_err(|source| BuildError::FeedFile {
        path: path.display().to_string(),
        source,
    })
}

/// Wires every component into one [`Orchestrator`], reading each configured feed file once up
/// front. Adapters operate over the loaded content rather than re-reading their file per fetch,
/// so a run's feed inputs are fixed at build time, not at the moment each feed is polled.
pub fn build_orchestrator(config: &ReconConfig) -> Result<Orchestrator, BuildError> {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let match_engine = MatchingEngine::new(config.matching);
    let resolver = AutoResolver::with_builtin_rules(config.alias_table());
    let collaborator: Arc<dyn WorkflowCollaborator> = Arc::new(InMemoryCollaborator::new());

    let internal_content = read_feed_file(&config.internal_feed.path)?;
    let internal_feed: Arc<dyn FeedAdapter> = Arc::new(DelimitedTextAdapter::new(
        config.internal_feed.source_tag.clone(),
        internal_content,
        config.internal_feed.delimiter,
        config
            .internal_feed
            .column_mapping
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<HashMap<_, _>>(),
        recon_core::TradeSource::Internal,
    ));

    let mut external_feeds: Vec<Arc<dyn FeedAdapter>> = Vec::with_capacity(config.external_feeds.len());
    for feed in &config.external_feeds {
        external_feeds.push(match feed {
            ExternalFeedConfig::DelimitedText {
                source_tag,
                path,
                delimiter,
                column_mapping,
                trade_source,
            } => {
                let content = read_feed_file(path)?;
                Arc::new(DelimitedTextAdapter::new(
                    source_tag.clone(),
                    content,
                    *delimiter,
                    column_mapping.iter().map(|(k, v)| (k.clone(), v.clone())).collect::<HashMap<_, _>>(),
                    trade_source.clone(),
                )) as Arc<dyn FeedAdapter>
            }
            ExternalFeedConfig::TagValue {
                source_tag,
                path,
                delimiter,
                trade_source,
            } => {
                let content = read_feed_file(path)?;
                Arc::new(TagValueAdapter::new(source_tag.clone(), content, *delimiter, trade_source.clone()))
                    as Arc<dyn FeedAdapter>
            }
        });
    }

    Ok(Orchestrator::new(
        storage,
        match_engine,
        resolver,
        collaborator,
        config.orchestrator,
        internal_feed,
        external_feeds,
    ))
}
