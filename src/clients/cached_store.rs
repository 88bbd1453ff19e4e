//! 带有效期的读缓存
//!
//! 缓存命中的结果最多落后 `ttl`；`ttl` 为零时每次都直读底层存储

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::clients::TableStore;
use crate::error::StoreError;
use crate::models::Table;

pub struct CachedStore<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Table)>>,
}

impl<S: TableStore> CachedStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn caching(&self) -> bool {
        !self.ttl.is_zero()
    }
}

#[async_trait]
impl<S: TableStore> TableStore for CachedStore<S> {
    async fn read(&self, table: &str) -> Result<Table, StoreError> {
        if self.caching() {
            let entries = self.entries.lock().await;
            if let Some((fetched_at, cached)) = entries.get(table) {
                if fetched_at.elapsed() < self.ttl {
                    debug!("命中缓存: {}", table);
                    return Ok(cached.clone());
                }
            }
        }

        let fresh = self.inner.read(table).await?;
        if self.caching() {
            self.entries
                .lock()
                .await
                .insert(table.to_string(), (Instant::now(), fresh.clone()));
        }
        Ok(fresh)
    }

    async fn update(&self, table: &str, data: &Table) -> Result<(), StoreError> {
        let result = self.inner.update(table, data).await;
        let mut entries = self.entries.lock().await;
        match &result {
            Ok(()) if self.caching() => {
                entries.insert(table.to_string(), (Instant::now(), data.clone()));
            }
            _ => {
                entries.remove(table);
            }
        }
        result
    }

    async fn invalidate(&self, table: &str) {
        self.entries.lock().await.remove(table);
        self.inner.invalidate(table).await;
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}
