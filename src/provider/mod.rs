pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::ProviderConfig;
use crate::models::PricePoint;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use self::cleaner::clean_quote_rows;
use self::http_client::HttpClient;
use self::parsers::parse_chart;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable market data provider.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily closes for the last `window_days` days, oldest first. Holidays
    /// and weekends are simply absent; an empty vec means no data.
    async fn fetch_closes(&self, symbol: &str, window_days: u32) -> Result<Vec<PricePoint>>;
}

// ── Yahoo Finance ─────────────────────────────────────────────────────────────

pub struct YahooProvider {
    client: HttpClient,
    base_url: String,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// e.g. AAPL, 50 → {base}/AAPL?range=50d&interval=1d
    fn chart_url(&self, symbol: &str, window_days: u32) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid provider base URL {}", self.base_url))?;

        url.path_segments_mut()
            .map_err(|_| anyhow!("Provider base URL {} cannot take a path", self.base_url))?
            .push(symbol);

        url.query_pairs_mut()
            .append_pair("range", &format!("{}d", window_days))
            .append_pair("interval", "1d");

        Ok(url)
    }
}

#[async_trait]
impl MarketDataSource for YahooProvider {
    async fn fetch_closes(&self, symbol: &str, window_days: u32) -> Result<Vec<PricePoint>> {
        let url = self.chart_url(symbol, window_days)?;
        debug!("Fetching chart: {}", url);

        let body = self.client.get_text(&url).await
            .with_context(|| format!("Failed to fetch chart for {}", symbol))?;

        let raw_rows = parse_chart(&body, symbol)?;
        if raw_rows.is_empty() {
            warn!("{}: provider returned no rows for {}d", symbol, window_days);
        }

        let points = clean_quote_rows(symbol, raw_rows, window_days);
        debug!("{}: {} daily closes", symbol, points.len());

        Ok(points)
    }
}

// ── Test double ───────────────────────────────────────────────────────────────

#[cfg(test)]
pub mod testing {
    use super::*;
    use chrono::{Days, NaiveDate};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory source that counts how often it is asked.
    #[derive(Default)]
    pub struct FakeSource {
        series: HashMap<String, Vec<PricePoint>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl FakeSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_series(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
            self.series.insert(symbol.to_string(), points);
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataSource for FakeSource {
        async fn fetch_closes(&self, symbol: &str, window_days: u32) -> Result<Vec<PricePoint>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let points = self
                .series
                .get(symbol)
                .ok_or_else(|| anyhow!("HTTP error 404 Not Found"))?;
            let skip = points.len().saturating_sub(window_days as usize);
            Ok(points[skip..].to_vec())
        }
    }

    /// Consecutive calendar days starting at `start`.
    pub fn daily(start: NaiveDate, closes: &[Option<f64>]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| PricePoint {
                date: start + Days::new(i as u64),
                close: *close,
            })
            .collect()
    }

    pub fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }
}
