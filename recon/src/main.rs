mod builder;
mod cli;
mod config;
mod logging;

use clap::Parser;
use cli::Cli;
use config::ReconConfig;
use recon_orchestrator::CancellationToken;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Build(#[from] builder::BuildError),
    #[error(transparent)]
    Reconciliation(#[from] recon_core::ReconError),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("recon: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), RunError> {
    let cli = Cli::parse();
    let mut config = ReconConfig::load(&cli.config)?;
    config.orchestrator.force_rerun |= cli.force_rerun;

    logging::init_logging(&config.log_filter);
    info!(trade_date = %cli.trade_date, config = %cli.config.display(), "starting reconciliation run");

    let orchestrator = builder::build_orchestrator(&config)?;
    let cancellation = CancellationToken::new();

    match orchestrator.run_daily_reconciliation(cli.trade_date, &cancellation).await {
        Ok(result) => {
            info!(
                status = %result.run.status,
                internal_trades = result.run.total_internal_trades,
                external_trades = result.run.total_external_trades,
                matched = result.run.matched_trades,
                new_breaks = result.run.new_breaks,
                auto_resolved = result.run.auto_resolved_breaks,
                patterns = result.patterns.len(),
                feed_failures = result.feed_failures.len(),
                "reconciliation run finished"
            );
            for (source, message) in &result.feed_failures {
                error!(source, message, "feed did not complete this run");
            }
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}
