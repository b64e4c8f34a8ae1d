//! Decoding of Yahoo Finance v8 chart responses.

use crate::models::RawQuoteRow;
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

// ── Wire format ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Extract the (timestamp, close) pairs of the first chart result.
///
/// A response without timestamps is a valid "no trades in range" answer and
/// yields no rows; an explicit `chart.error` or a missing result is an error.
pub fn parse_chart(json: &str, symbol: &str) -> Result<Vec<RawQuoteRow>> {
    let resp: ChartResponse = serde_json::from_str(json)
        .with_context(|| format!("{}: unexpected chart response shape", symbol))?;

    if let Some(err) = resp.chart.error {
        bail!("{}: {} ({})", symbol, err.description, err.code);
    }

    let data = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| anyhow!("{}: empty chart result", symbol))?;

    let Some(timestamps) = data.timestamp else {
        return Ok(vec![]);
    };

    let closes = data
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let offset = data.meta.gmtoffset;
    Ok(timestamps
        .into_iter()
        .enumerate()
        .map(|(i, timestamp)| RawQuoteRow {
            timestamp,
            gmtoffset: offset,
            close: closes.get(i).copied().flatten(),
        })
        .collect())
}
