//! Wide ⇄ long conversion of price tables.

use crate::error::DashboardError;
use crate::models::{LongRow, LongTable, WideRow, WideTable};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Keep only the selected companies, in selection order. Every date column
/// survives, even one where no selected company traded.
pub fn restrict(wide: &WideTable, selection: &[String]) -> Result<WideTable, DashboardError> {
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(selection.len());

    for name in selection {
        if !seen.insert(name.as_str()) {
            continue;
        }
        let row = wide
            .row(name)
            .ok_or_else(|| DashboardError::UnknownCompany(name.clone()))?;
        rows.push(row.clone());
    }

    Ok(WideTable {
        dates: wide.dates.clone(),
        rows,
    })
}

/// Unpivot: one row per (company, date), company-major. Missing closes are
/// kept as `None` so the chart can draw a gap.
pub fn to_long(wide: &WideTable) -> LongTable {
    let rows = wide
        .rows
        .iter()
        .flat_map(|row| {
            wide.dates
                .iter()
                .zip(row.values.iter())
                .map(move |(date, price)| LongRow {
                    name: row.name.clone(),
                    date: *date,
                    price: *price,
                })
        })
        .collect();

    LongTable { rows }
}

/// Pivot back on (company, date). Companies keep first-seen order, dates
/// are sorted, absent pairs become `None`.
pub fn to_wide(long: &LongTable) -> WideTable {
    let mut names: Vec<&str> = Vec::new();
    let mut cells: HashMap<(&str, NaiveDate), Option<f64>> = HashMap::new();
    let mut dates = BTreeSet::new();

    for row in &long.rows {
        if !names.contains(&row.name.as_str()) {
            names.push(&row.name);
        }
        dates.insert(row.date);
        cells.insert((row.name.as_str(), row.date), row.price);
    }

    let dates: Vec<NaiveDate> = dates.into_iter().collect();
    let rows = names
        .into_iter()
        .map(|name| WideRow {
            name: name.to_string(),
            values: dates
                .iter()
                .map(|d| cells.get(&(name, *d)).copied().flatten())
                .collect(),
        })
        .collect();

    WideTable { dates, rows }
}
