use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use recon_core::{ReconError, Trade, TradeId, TradeSource, TradeStatus};
use rust_decimal::Decimal;
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Ordered fallback list tried in turn; the first format is also the one canonical records are
/// re-serialized with, which is what makes [`normalize`] idempotent.
const TRADE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const SETTLEMENT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Result of normalizing one raw row: the canonical trade plus any non-fatal warnings raised
/// along the way (a defaulted numeric field, a settlement date that fell back to the trade
/// date, and so on).
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOutcome {
    pub trade: Trade,
    pub warnings: Vec<String>,
}

fn parse_trade_date(raw: &str) -> Option<DateTime<Utc>> {
    TRADE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_settlement_date(raw: &str) -> Option<NaiveDate> {
    SETTLEMENT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

fn parse_decimal_flagged(raw: Option<&String>, field: &str, warnings: &mut Vec<String>) -> Decimal {
    match raw.map(|s| s.trim()) {
        None | Some("") => {
            warnings.push(format!("{field} missing or empty, defaulted to 0"));
            Decimal::ZERO
        }
        Some(value) => Decimal::from_str(value).unwrap_or_else(|_| {
            warnings.push(format!("{field} value '{value}' is not a valid decimal, defaulted to 0"));
            Decimal::ZERO
        }),
    }
}

/// Builds the record `raw_data` is set to: the original row, so any field an adapter couldn't
/// map to a canonical column (e.g. an unrecognized FIX tag) survives for audit, with the
/// canonical fields overwritten using the same formats [`parse_trade_date`] and
/// [`parse_settlement_date`] try first — this is what makes re-normalizing it idempotent.
fn canonical_raw_data(original: &BTreeMap<String, String>, trade: &Trade) -> BTreeMap<String, String> {
    let mut map = original.clone();
    map.insert("trade_id".to_string(), trade.trade_id.0.to_string());
    map.insert(
        "trade_date".to_string(),
        trade.trade_date.format(TRADE_DATE_FORMATS[0]).to_string(),
    );
    map.insert(
        "settlement_date".to_string(),
        trade.settlement_date.format(SETTLEMENT_DATE_FORMATS[0]).to_string(),
    );
    map.insert("instrument_id".to_string(), trade.instrument_id.to_string());
    if let Some(name) = &trade.instrument_name {
        map.insert("instrument_name".to_string(), name.clone());
    }
    map.insert("quantity".to_string(), trade.quantity.to_string());
    map.insert("price".to_string(), trade.price.to_string());
    map.insert("currency".to_string(), trade.currency.to_string());
    map.insert("counterparty".to_string(), trade.counterparty.clone());
    if let Some(account) = &trade.account {
        map.insert("account".to_string(), account.to_string());
    }
    map
}

/// Normalizes one raw row into a canonical [`Trade`]. Fails only when `trade_date` is absent or
/// unparseable against every known format; every other defect downgrades to a warning.
pub fn normalize(raw: &BTreeMap<String, String>, source: TradeSource) -> Result<NormalizeOutcome, ReconError> {
    let trade_id = raw.get("trade_id").cloned().unwrap_or_default();

    let trade_date_raw = raw.get("trade_date").ok_or_else(|| ReconError::ParseWarning {
        row: trade_id.clone(),
        message: "missing trade_date".to_string(),
    })?;
    let trade_date = parse_trade_date(trade_date_raw).ok_or_else(|| ReconError::ParseWarning {
        row: trade_id.clone(),
        message: format!("trade_date '{trade_date_raw}' matched no known format"),
    })?;

    let mut warnings = Vec::new();

    let settlement_date = match raw.get("settlement_date") {
        Some(raw_value) => parse_settlement_date(raw_value).unwrap_or_else(|| {
            warnings.push(format!(
                "settlement_date '{raw_value}' matched no known format, defaulted to trade date"
            ));
            trade_date.date_naive()
        }),
        None => trade_date.date_naive(),
    };

    let quantity = parse_decimal_flagged(raw.get("quantity"), "quantity", &mut warnings);
    let price = parse_decimal_flagged(raw.get("price"), "price", &mut warnings);

    let mut trade = Trade {
        id: None,
        trade_id: TradeId::from(trade_id.as_str()),
        source,
        trade_date,
        settlement_date,
        instrument_id: SmolStr::new(raw.get("instrument_id").map(String::as_str).unwrap_or_default()),
        instrument_name: raw.get("instrument_name").cloned(),
        quantity,
        price,
        currency: SmolStr::new(raw.get("currency").map(String::as_str).unwrap_or_default()),
        counterparty: raw.get("counterparty").cloned().unwrap_or_default(),
        account: raw.get("account").map(|s| SmolStr::new(s.as_str())),
        status: TradeStatus::default(),
        matched_trade_id: None,
        raw_data: BTreeMap::new(),
    };

    if trade.has_settlement_before_trade() {
        warnings.push(format!(
            "settlement_date {} precedes trade_date {}",
            trade.settlement_date,
            trade.trade_date.date_naive()
        ));
    }

    trade.raw_data = canonical_raw_data(raw, &trade);

    Ok(NormalizeOutcome { trade, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn missing_trade_date_is_an_error() {
        let raw = row(&[("trade_id", "T1")]);
        assert!(normalize(&raw, TradeSource::Internal).is_err());
    }

    #[test]
    fn empty_quantity_defaults_to_zero_and_warns() {
        let raw = row(&[
            ("trade_id", "T1"),
            ("trade_date", "2024-01-05 09:00:00"),
            ("quantity", ""),
            ("price", "10.00"),
        ]);
        let outcome = normalize(&raw, TradeSource::Internal).unwrap();
        assert_eq!(outcome.trade.quantity, Decimal::ZERO);
        assert!(outcome.warnings.iter().any(|w| w.contains("quantity")));
    }

    #[test]
    fn settlement_before_trade_date_warns_but_does_not_fail() {
        let raw = row(&[
            ("trade_id", "T1"),
            ("trade_date", "2024-01-05 09:00:00"),
            ("settlement_date", "2024-01-01"),
            ("quantity", "100"),
            ("price", "10"),
        ]);
        let outcome = normalize(&raw, TradeSource::Internal).unwrap();
        assert!(outcome.warnings.iter().any(|w| w.contains("precedes")));
    }

    #[test]
    fn normalize_is_idempotent_over_its_own_raw_data() {
        let raw = row(&[
            ("trade_id", "T1"),
            ("trade_date", "2024-01-05 09:00:00"),
            ("settlement_date", "2024-01-08"),
            ("instrument_id", "ABC"),
            ("quantity", "100"),
            ("price", "10.50"),
            ("currency", "USD"),
            ("counterparty", "JPM"),
        ]);
        let first = normalize(&raw, TradeSource::Internal).unwrap();
        let second = normalize(&first.trade.raw_data, TradeSource::Internal).unwrap();

        assert_eq!(first.trade.trade_id, second.trade.trade_id);
        assert_eq!(first.trade.trade_date, second.trade.trade_date);
        assert_eq!(first.trade.settlement_date, second.trade.settlement_date);
        assert_eq!(first.trade.quantity, second.trade.quantity);
        assert_eq!(first.trade.price, second.trade.price);
        assert_eq!(first.trade.raw_data, second.trade.raw_data);
    }
}
