/// Initializes the process-wide `tracing` subscriber. Library crates only ever emit events;
/// this is the one place a subscriber is installed.
pub fn init_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(
                    filter.parse().unwrap_or(tracing_subscriber::filter::LevelFilter::INFO.into()),
                )
                .from_env_lossy(),
        )
        .with_ansi(cfg!(debug_assertions))
        .init();
}
