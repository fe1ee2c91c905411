use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Runs one day's trade reconciliation.
#[derive(Debug, Parser)]
#[command(name = "recon", version, about)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "recon.toml")]
    pub config: PathBuf,

    /// Trading day to reconcile, as YYYY-MM-DD.
    #[arg(long, value_parser = parse_trade_date)]
    pub trade_date: NaiveDate,

    /// Supersede a non-failed run already recorded for this trade date.
    #[arg(long)]
    pub force_rerun: bool,
}

fn parse_trade_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|error| format!("invalid trade date '{raw}': {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_an_iso_date() {
        assert_eq!(parse_trade_date("2024-01-05").unwrap(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn rejects_a_malformed_date() {
        assert!(parse_trade_date("01/05/2024").is_err());
    }
}
