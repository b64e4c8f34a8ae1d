//! Market data fetcher: ties the provider → Wide Table together.
//!
//! One provider call per mapping entry, issued sequentially in mapping
//! order. The first symbol that fails or comes back without a single close
//! aborts the fetch with `DataUnavailable`; there are no partial tables.

use crate::error::DashboardError;
use crate::models::{PriceSeries, SymbolMapping, WideTable};
use crate::provider::MarketDataSource;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Pipeline {
    source: Arc<dyn MarketDataSource>,
}

impl Pipeline {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    pub async fn fetch(
        &self,
        window_days: u32,
        mapping: &SymbolMapping,
    ) -> Result<WideTable, DashboardError> {
        if window_days == 0 {
            return Err(DashboardError::InvalidParameters(
                "lookback window must be at least one day".into(),
            ));
        }

        info!("Fetching {} symbols over {}d", mapping.len(), window_days);
        let mut series = Vec::with_capacity(mapping.len());

        for (name, symbol) in mapping.iter() {
            let points = self
                .source
                .fetch_closes(symbol, window_days)
                .await
                .map_err(|e| {
                    warn!("{} ({}): {:#}", name, symbol, e);
                    DashboardError::DataUnavailable {
                        symbol: symbol.to_string(),
                        reason: format!("{:#}", e),
                    }
                })?;

            if points.iter().all(|p| p.close.is_none()) {
                warn!("{} ({}): no closes in the last {}d", name, symbol, window_days);
                return Err(DashboardError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: format!("no closing prices in the last {} days", window_days),
                });
            }

            info!(
                "{} ({}): {} closes (latest: {:?})",
                name,
                symbol,
                points.len(),
                points.last().map(|p| p.date)
            );

            series.push(PriceSeries {
                name: name.to_string(),
                symbol: symbol.to_string(),
                points,
            });
        }

        let wide = WideTable::from_series(series);
        info!("Wide table: {:?} × {} dates", wide.names(), wide.dates.len());
        Ok(wide)
    }
}
