use crate::models::{PricePoint, RawQuoteRow};
use chrono::{DateTime, NaiveDate};
use std::collections::BTreeMap;
use tracing::warn;

/// Trading date of a bar, in the exchange's local calendar.
pub fn trading_date(row: &RawQuoteRow) -> Option<NaiveDate> {
    DateTime::from_timestamp(row.timestamp.checked_add(row.gmtoffset)?, 0)
        .map(|dt| dt.naive_utc().date())
}

/// Closes must be finite and positive; anything else becomes a gap.
pub fn clean_close(symbol: &str, date: NaiveDate, close: Option<f64>) -> Option<f64> {
    let close = close?;
    if !close.is_finite() || close <= 0.0 {
        warn!("Invalid close {} for {} on {}", close, symbol, date);
        return None;
    }
    Some(close)
}

// ── Raw rows → PricePoint ─────────────────────────────────────────────────────

/// Convert raw chart rows into a chronological series of at most
/// `window_days` dates. A date seen twice (Yahoo repeats the live session
/// bar) keeps its last close.
pub fn clean_quote_rows(symbol: &str, rows: Vec<RawQuoteRow>, window_days: u32) -> Vec<PricePoint> {
    let mut by_date: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();

    for row in &rows {
        let Some(date) = trading_date(row) else {
            warn!("{}: dropping row with invalid timestamp {}", symbol, row.timestamp);
            continue;
        };
        by_date.insert(date, clean_close(symbol, date, row.close));
    }

    let skip = by_date.len().saturating_sub(window_days as usize);
    by_date
        .into_iter()
        .skip(skip)
        .map(|(date, close)| PricePoint { date, close })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
