//! Process-lifetime memoization of fetched Wide Tables.
//!
//! Keyed structurally on (window, mapping). Each key owns a `OnceCell`, so
//! concurrent renders asking for the same key wait on one in-flight fetch
//! instead of each hitting the provider. Failed fetches leave the cell
//! empty and are retried by the next caller. Nothing is ever evicted.

use crate::error::DashboardError;
use crate::models::{SymbolMapping, WideTable};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub window_days: u32,
    pub mapping: SymbolMapping,
}

impl CacheKey {
    pub fn new(window_days: u32, mapping: &SymbolMapping) -> Self {
        Self {
            window_days,
            mapping: mapping.clone(),
        }
    }
}

type Slot = Arc<OnceCell<Arc<WideTable>>>;

#[derive(Default)]
pub struct ResultCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the table stored under `key`, running `fetch` only if no
    /// earlier call for an equal key has succeeded.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: CacheKey,
        fetch: F,
    ) -> Result<Arc<WideTable>, DashboardError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<WideTable, DashboardError>>,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        if let Some(table) = slot.get() {
            debug!("Cache hit for {}d × {} symbols", key.window_days, key.mapping.len());
            return Ok(Arc::clone(table));
        }

        slot.get_or_try_init(|| async {
            debug!("Cache miss for {}d × {} symbols", key.window_days, key.mapping.len());
            fetch().await.map(Arc::new)
        })
        .await
        .cloned()
    }

    /// Number of keys holding a table.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }
}
