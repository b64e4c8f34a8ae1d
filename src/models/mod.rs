use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::utils::display_date;
use tracing::debug;

/// Display label of the value column produced by the reshape.
pub const PRICE_LABEL: &str = "Stock Prices(USD)";

// ── Symbol mapping ────────────────────────────────────────────────────────────

/// Ordered company name → ticker symbol mapping. Names are unique and
/// insertion order is the default display order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SymbolMapping {
    entries: Vec<(String, String)>,
}

impl SymbolMapping {
    /// The fixed universe shown by the dashboard.
    pub fn default_universe() -> Self {
        let entries = [
            ("apple", "AAPL"),
            ("google", "GOOGL"),
            ("microsoft", "MSFT"),
            ("netflix", "NFLX"),
            ("amazon", "AMZN"),
        ]
        .into_iter()
        .map(|(name, symbol)| (name.to_string(), symbol.to_string()))
        .collect();

        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s.as_str()))
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn symbol_for(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbol_for(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
impl SymbolMapping {
    pub fn from_pairs<I, N, S>(pairs: I) -> Result<Self, crate::error::DashboardError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut seen = std::collections::HashSet::new();
        let mut entries = Vec::new();

        for (name, symbol) in pairs {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(crate::error::DashboardError::InvalidParameters(format!(
                    "duplicate company name {name:?} in symbol mapping"
                )));
            }
            entries.push((name, symbol.into()));
        }

        Ok(Self { entries })
    }
}

// ── Price series ──────────────────────────────────────────────────────────────

/// One daily observation. `close` is `None` when the provider listed the
/// date without a closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

/// Chronological closes for one company.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub name: String,
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

// ── Raw provider rows ─────────────────────────────────────────────────────────

/// One entry of a chart response before date conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawQuoteRow {
    /// Unix seconds, UTC.
    pub timestamp: i64,
    /// Exchange offset from UTC in seconds.
    pub gmtoffset: i64,
    pub close: Option<f64>,
}

// ── Wide table ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WideRow {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// One row per company, one column per date. `values[i]` lines up with
/// `dates[i]`; dates are kept sorted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WideTable {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    /// Merge per-company series into one table over the union of their dates.
    pub fn from_series(series: Vec<PriceSeries>) -> Self {
        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rows = series
            .into_iter()
            .map(|s| {
                debug!("Merging {} ({}): {} points", s.name, s.symbol, s.points.len());
                let by_date: HashMap<NaiveDate, Option<f64>> =
                    s.points.iter().map(|p| (p.date, p.close)).collect();
                WideRow {
                    name: s.name,
                    values: dates
                        .iter()
                        .map(|d| by_date.get(d).copied().flatten())
                        .collect(),
                }
            })
            .collect();

        Self { dates, rows }
    }

    pub fn row(&self, name: &str) -> Option<&WideRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.name.clone()).collect()
    }

    /// Display form: rows sorted by company name, dates formatted.
    pub fn to_view(&self) -> TableView {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));

        TableView {
            columns: self.dates.iter().map(|d| display_date(*d)).collect(),
            rows,
        }
    }
}

/// What the dashboard shows above the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<WideRow>,
}

// ── Long table ────────────────────────────────────────────────────────────────

/// One (company, date, price) observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    // must equal PRICE_LABEL; the chart's y field points at this key
    #[serde(rename = "Stock Prices(USD)")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct LongTable {
    pub rows: Vec<LongRow>,
}

impl LongTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
