use crate::cancellation::CancellationToken;
use crate::collaborator::WorkflowCollaborator;
use crate::config::OrchestratorConfig;
use chrono::{DateTime, NaiveDate, Utc};
use recon_core::{Break, ReconError, ReconciliationRun, RecordId, RunStatus, Trade, TradeStatus};
use recon_feeds::FeedAdapter;
use recon_match::MatchingEngine;
use recon_patterns::{detect_patterns, PatternInput, PatternSummary};
use recon_resolve::{AutoResolver, Resolution, ResolutionInput};
use recon_storage::Storage;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Outcome of one [`Orchestrator::run_daily_reconciliation`] call.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run: ReconciliationRun,
    pub resolutions: Vec<Resolution>,
    pub patterns: Vec<PatternSummary>,
    /// `(source_tag, message)` for every external feed that failed or timed out this run. The
    /// internal feed is never in this list: its failure is fatal and surfaces as an `Err`.
    pub feed_failures: Vec<(String, String)>,
}

struct IngestionOutcome {
    internal_trades: Vec<Trade>,
    external_trades: Vec<Trade>,
    feed_failures: Vec<(String, String)>,
    parse_warnings: Vec<String>,
}

/// Wires the feed adapters, matching engine, classifier, auto-resolver, pattern detector,
/// storage and workflow collaborator into the single daily reconciliation sequence.
pub struct Orchestrator {
    storage: Arc<dyn Storage>,
    match_engine: MatchingEngine,
    resolver: AutoResolver,
    collaborator: Arc<dyn WorkflowCollaborator>,
    config: OrchestratorConfig,
    internal_feed: Arc<dyn FeedAdapter>,
    external_feeds: Vec<Arc<dyn FeedAdapter>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("external_feeds", &self.external_feeds.len())
            .finish()
    }
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        storage: Arc<dyn Storage>,
        match_engine: MatchingEngine,
        resolver: AutoResolver,
        collaborator: Arc<dyn WorkflowCollaborator>,
        config: OrchestratorConfig,
        internal_feed: Arc<dyn FeedAdapter>,
        external_feeds: Vec<Arc<dyn FeedAdapter>>,
    ) -> Self {
        Self {
            storage,
            match_engine,
            resolver,
            collaborator,
            config,
            internal_feed,
            external_feeds,
        }
    }

    /// Runs the full pipeline for `trade_date`. Checked against `cancellation` between steps,
    /// never mid-step; any propagated error or a cancellation closes the run as `failed` before
    /// being re-raised to the caller.
    pub async fn run_daily_reconciliation(
        &self,
        trade_date: NaiveDate,
        cancellation: &CancellationToken,
    ) -> Result<RunResult, ReconError> {
        let started_at = Utc::now();

        if let Some(existing) = self.storage.find_run_by_date(trade_date).await? {
            let non_failed = !matches!(existing.status, RunStatus::Failed);
            if non_failed && !self.config.force_rerun {
                return Err(ReconError::AlreadyRun { trade_date });
            }
            if non_failed {
                let mut superseded = existing;
                superseded.status = RunStatus::Superseded;
                self.storage.update_run(superseded).await?;
            }
        }

        let run_id = self.storage.create_run(trade_date, started_at).await?;
        let mut run = ReconciliationRun::new(trade_date, started_at);
        run.id = Some(run_id);

        match self.execute(trade_date, &mut run, cancellation).await {
            Ok((resolutions, patterns, feed_failures)) => {
                run.complete(Utc::now());
                self.storage.update_run(run.clone()).await?;
                Ok(RunResult {
                    run,
                    resolutions,
                    patterns,
                    feed_failures,
                })
            }
            Err(error) => {
                let message = match &error {
                    ReconError::Cancelled => "cancelled".to_string(),
                    other => other.to_string(),
                };
                error!(trade_date = %trade_date, %message, "reconciliation run failed");
                run.fail(Utc::now(), message);
                self.storage.update_run(run).await?;
                Err(error)
            }
        }
    }

    async fn execute(
        &self,
        trade_date: NaiveDate,
        run: &mut ReconciliationRun,
        cancellation: &CancellationToken,
    ) -> Result<(Vec<Resolution>, Vec<PatternSummary>, Vec<(String, String)>), ReconError> {
        self.check_cancelled(cancellation)?;

        let ingestion = self.ingest(trade_date).await?;
        let feed_failures = ingestion.feed_failures;
        run.total_internal_trades = ingestion.internal_trades.len() as u64;
        run.total_external_trades = ingestion.external_trades.len() as u64;
        run.parse_warnings = ingestion.parse_warnings;
        self.storage.update_run(run.clone()).await?;
        self.check_cancelled(cancellation)?;

        let mut internal_trades = ingestion.internal_trades;
        let mut external_trades = ingestion.external_trades;
        self.persist_trades(&mut internal_trades).await?;
        self.persist_trades(&mut external_trades).await?;
        self.check_cancelled(cancellation)?;

        let now = Utc::now();
        let match_output = self.match_engine.match_trades(&internal_trades, &external_trades, now);
        run.matched_trades = match_output.matched.len() as u64;

        for outcome in &match_output.matched {
            let internal_trade = &internal_trades[outcome.internal_index];
            let external_trade = &external_trades[outcome.external_index];
            if let (Some(internal_id), Some(external_id)) = (internal_trade.id, external_trade.id) {
                self.storage
                    .update_trade_status(internal_id, TradeStatus::Matched, Some(external_id))
                    .await?;
                self.storage
                    .update_trade_status(external_id, TradeStatus::Matched, Some(internal_id))
                    .await?;
            }
        }
        self.check_cancelled(cancellation)?;

        let mut breaks = match_output.breaks;
        for break_ in breaks.iter_mut() {
            let id = self.storage.save_break(break_.clone()).await?;
            break_.id = Some(id);
        }
        run.new_breaks = breaks.len() as u64;
        self.check_cancelled(cancellation)?;

        let trades_by_id: HashMap<RecordId, &Trade> = internal_trades
            .iter()
            .chain(external_trades.iter())
            .filter_map(|trade| trade.id.map(|id| (id, trade)))
            .collect();

        self.classify_breaks(&mut breaks, &trades_by_id, now);
        for break_ in &breaks {
            self.storage.update_break(break_.clone()).await?;
        }
        self.check_cancelled(cancellation)?;

        let resolutions = self.resolve_breaks(&mut breaks, &trades_by_id, now).await?;
        run.auto_resolved_breaks = resolutions.len() as u64;
        self.check_cancelled(cancellation)?;

        for break_ in breaks.iter().filter(|b| !b.status.is_resolved()) {
            if let Err(error) = self.collaborator.create_case(break_).await {
                warn!(break_id = ?break_.id, %error, "failed to hand break to workflow collaborator");
            }
        }
        self.check_cancelled(cancellation)?;

        let open_inputs: Vec<PatternInput<'_>> = breaks
            .iter()
            .filter(|b| !b.status.is_resolved())
            .filter_map(|b| trades_by_id.get(&b.trade_ref).map(|&subject| PatternInput { break_: b, subject }))
            .collect();
        let patterns = detect_patterns(&open_inputs);

        Ok((resolutions, patterns, feed_failures))
    }

    fn check_cancelled(&self, cancellation: &CancellationToken) -> Result<(), ReconError> {
        if cancellation.is_cancelled() {
            return Err(ReconError::Cancelled);
        }
        Ok(())
    }

    async fn persist_trades(&self, trades: &mut [Trade]) -> Result<(), ReconError> {
        for trade in trades.iter_mut() {
            let id = self.storage.save_trade(trade.clone()).await?;
            trade.id = Some(id);
        }
        Ok(())
    }

    fn classify_breaks(&self, breaks: &mut [Break], trades_by_id: &HashMap<RecordId, &Trade>, now: DateTime<Utc>) {
        for break_ in breaks.iter_mut() {
            let Some(&subject) = trades_by_id.get(&break_.trade_ref) else {
                warn!(break_id = ?break_.id, "break references an unknown trade; skipping classification");
                continue;
            };
            let counterpart = break_.matched_trade_ref.and_then(|id| trades_by_id.get(&id).copied());
            recon_classify::classify(break_, subject, counterpart, now);
        }
    }

    async fn resolve_breaks(
        &self,
        breaks: &mut [Break],
        trades_by_id: &HashMap<RecordId, &Trade>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Resolution>, ReconError> {
        let mut inputs: Vec<ResolutionInput<'_>> = Vec::new();
        for break_ in breaks.iter_mut() {
            let Some(&subject) = trades_by_id.get(&break_.trade_ref) else {
                continue;
            };
            let counterpart = break_.matched_trade_ref.and_then(|id| trades_by_id.get(&id).copied());
            inputs.push(ResolutionInput { break_, subject, counterpart });
        }

        let batch_result = self.resolver.batch_auto_resolve(&mut inputs, now);
        let resolved_ids: HashSet<RecordId> = batch_result.resolutions.iter().filter_map(|r| r.break_id).collect();
        drop(inputs);

        for break_ in breaks.iter().filter(|b| b.id.is_some_and(|id| resolved_ids.contains(&id))) {
            self.storage.update_break(break_.clone()).await?;
        }

        info!(
            total = batch_result.total,
            auto_resolved = batch_result.auto_resolved,
            failed = batch_result.failed,
            "auto-resolution batch complete"
        );
        Ok(batch_result.resolutions)
    }

    async fn ingest(&self, trade_date: NaiveDate) -> Result<IngestionOutcome, ReconError> {
        let timeout = StdDuration::from_secs(self.config.feed_timeout_seconds);

        let internal_future = async {
            match tokio::time::timeout(timeout, self.internal_feed.fetch(trade_date)).await {
                Ok(result) => result,
                Err(_) => Err(ReconError::FeedIo {
                    feed_source: self.internal_feed.source_tag().to_string(),
                    message: "internal feed timed out".to_string(),
                }),
            }
        };

        let semaphore = Semaphore::new(self.config.ingest_worker_pool_size.max(1));
        let external_futures = self.external_feeds.iter().map(|adapter| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore is never closed");
                let source_tag = adapter.source_tag().to_string();
                let outcome = tokio::time::timeout(timeout, adapter.fetch(trade_date)).await;
                (source_tag, outcome)
            }
        });

        let (internal_result, external_results) =
            tokio::join!(internal_future, futures::future::join_all(external_futures));

        let internal = internal_result?;

        let mut external_trades = Vec::new();
        let mut feed_failures = Vec::new();
        let mut parse_warnings = internal.warnings;

        for (source_tag, outcome) in external_results {
            match outcome {
                Ok(Ok(fetch_result)) => {
                    parse_warnings.extend(fetch_result.warnings);
                    external_trades.extend(fetch_result.trades);
                }
                Ok(Err(error)) => {
                    warn!(source = %source_tag, %error, "external feed failed");
                    feed_failures.push((source_tag, error.to_string()));
                }
                Err(_elapsed) => {
                    warn!(source = %source_tag, "external feed timed out");
                    feed_failures.push((source_tag, "feed timed out".to_string()));
                }
            }
        }

        Ok(IngestionOutcome {
            internal_trades: internal.trades,
            external_trades,
            feed_failures,
            parse_warnings,
        })
    }
}
