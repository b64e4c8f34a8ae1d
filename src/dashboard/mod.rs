//! Dashboard controller: one render pass per user interaction.
//!
//! ## Render pass
//!
//! 1. Empty selection → `EmptySelection`, nothing else runs
//! 2. Validate days / price range / company names
//! 3. Cache lookup, fetching on a miss
//! 4. Restrict to the selection → reshape → chart
//!
//! Errors come back typed. `RenderReply` turns them into what the user sees:
//! a specific message for an empty selection, one generic message for
//! everything else.

use crate::cache::{CacheKey, ResultCache};
use crate::chart::{self, ChartSpec};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, ErrorKind};
use crate::models::{LongTable, SymbolMapping, TableView};
use crate::pipeline::Pipeline;
use crate::provider::MarketDataSource;
use crate::reshape;
use crate::utils::Timer;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Current values of the dashboard controls.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub days: u32,
    pub price_range: (f64, f64),
    pub companies: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderOutput {
    pub table: TableView,
    #[serde(skip)]
    pub long: LongTable,
    pub chart: ChartSpec,
}

pub struct Dashboard {
    pipeline: Pipeline,
    cache: ResultCache,
    mapping: SymbolMapping,
    limits: DashboardConfig,
}

impl Dashboard {
    pub fn new(source: Arc<dyn MarketDataSource>, limits: DashboardConfig) -> Self {
        Self::with_mapping(source, SymbolMapping::default_universe(), limits)
    }

    pub fn with_mapping(
        source: Arc<dyn MarketDataSource>,
        mapping: SymbolMapping,
        limits: DashboardConfig,
    ) -> Self {
        Self {
            pipeline: Pipeline::new(source),
            cache: ResultCache::new(),
            mapping,
            limits,
        }
    }

    pub fn mapping(&self) -> &SymbolMapping {
        &self.mapping
    }

    pub fn limits(&self) -> &DashboardConfig {
        &self.limits
    }

    /// Initial load: default window, full price range, every company.
    pub fn default_request(&self) -> RenderRequest {
        RenderRequest {
            days: self.limits.default_days,
            price_range: (self.limits.price_floor, self.limits.price_ceiling),
            companies: self.mapping.names(),
        }
    }

    fn validate(&self, req: &RenderRequest) -> Result<(), DashboardError> {
        if req.days == 0 || req.days > self.limits.max_days {
            return Err(DashboardError::InvalidParameters(format!(
                "days must be between 1 and {}, got {}",
                self.limits.max_days, req.days
            )));
        }

        let (ymin, ymax) = req.price_range;
        let in_bounds = |p: f64| {
            p.is_finite() && p >= self.limits.price_floor && p <= self.limits.price_ceiling
        };
        if !in_bounds(ymin) || !in_bounds(ymax) || ymin > ymax {
            return Err(DashboardError::InvalidParameters(format!(
                "price range [{}, {}] outside [{}, {}]",
                ymin, ymax, self.limits.price_floor, self.limits.price_ceiling
            )));
        }

        if let Some(unknown) = req.companies.iter().find(|c| !self.mapping.contains(c)) {
            return Err(DashboardError::UnknownCompany(unknown.clone()));
        }

        Ok(())
    }

    pub async fn render(&self, req: &RenderRequest) -> Result<RenderOutput, DashboardError> {
        if req.companies.is_empty() {
            return Err(DashboardError::EmptySelection);
        }
        self.validate(req)?;

        let _t = Timer::start(format!(
            "Render {}d [{}, {}] {:?}",
            req.days, req.price_range.0, req.price_range.1, req.companies
        ));

        let key = CacheKey::new(req.days, &self.mapping);
        let wide = self
            .cache
            .get_or_fetch(key, || self.pipeline.fetch(req.days, &self.mapping))
            .await?;

        let selected = reshape::restrict(&wide, &req.companies)?;
        let long = reshape::to_long(&selected);
        let chart = chart::build(&long, req.price_range);

        info!(
            "Rendered {} series, {} points, y in {:?} ({} tables cached)",
            chart.series_names().len(),
            chart.point_count(),
            chart.y_domain(),
            self.cache.len()
        );

        Ok(RenderOutput {
            table: reshape::to_wide(&long).to_view(),
            long,
            chart,
        })
    }
}

// ── Reply ─────────────────────────────────────────────────────────────────────

/// What a render pass shows: the table and chart, or a single message.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderReply {
    Ok(RenderOutput),
    Error {
        kind: ErrorKind,
        message: &'static str,
    },
}

impl From<Result<RenderOutput, DashboardError>> for RenderReply {
    fn from(result: Result<RenderOutput, DashboardError>) -> Self {
        match result {
            Ok(output) => RenderReply::Ok(output),
            Err(e) => {
                match e.kind() {
                    ErrorKind::EmptySelection => info!("Render skipped: {}", e),
                    ErrorKind::Generic => error!("Render failed: {}", e),
                }
                RenderReply::Error {
                    kind: e.kind(),
                    message: e.user_message(),
                }
            }
        }
    }
}
