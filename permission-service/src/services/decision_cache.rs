//! TTL-scoped grant/deny cache shared by concurrent checks.
//!
//! Entries are advisory: a miss sends the caller back to full evaluation.
//! Nothing here invalidates on upstream changes; staleness is bounded by
//! the TTL alone.

use async_trait::async_trait;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use super::error::ServiceError;
use super::redis::RedisDecisionCache;
use crate::config::{CacheBackend, EngineConfig};
use crate::models::ResourceKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecisionKey {
    pub consumer_id: Uuid,
    pub kind: ResourceKind,
    pub resource_id: String,
}

impl DecisionKey {
    pub fn new(consumer_id: Uuid, kind: ResourceKind, resource_id: impl Into<String>) -> Self {
        Self {
            consumer_id,
            kind,
            resource_id: resource_id.into(),
        }
    }

    pub fn redis_key(&self) -> String {
        format!("authz:decision:{}", self)
    }
}

impl fmt::Display for DecisionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.consumer_id, self.kind, self.resource_id)
    }
}

#[async_trait]
pub trait DecisionCache: Send + Sync {
    /// `Ok(None)` when the key is absent or expired.
    async fn get(&self, key: &DecisionKey) -> Result<Option<bool>, ServiceError>;
    async fn set_with_ttl(
        &self,
        key: &DecisionKey,
        value: bool,
        ttl_seconds: u64,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: bool,
    /// `None` when the TTL reaches past what the clock can represent.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Process-local cache backed by a `DashMap`.
#[derive(Default)]
pub struct MemoryDecisionCache {
    entries: DashMap<DecisionKey, Entry>,
}

impl MemoryDecisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    /// Purge expired entries every `interval` until the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(live) = cache.upgrade() else {
                    break;
                };
                let purged = live.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = live.len(), "Swept decision cache");
                }
            }
        })
    }
}

#[async_trait]
impl DecisionCache for MemoryDecisionCache {
    async fn get(&self, key: &DecisionKey) -> Result<Option<bool>, ServiceError> {
        let now = Instant::now();
        let hit = self.entries.get(key).map(|e| *e);
        match hit {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value)),
            Some(_) => {
                self.entries.remove_if(key, |_, e| !e.is_live(now));
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(
        &self,
        key: &DecisionKey,
        value: bool,
        ttl_seconds: u64,
    ) -> Result<(), ServiceError> {
        if ttl_seconds == 0 {
            self.entries.remove(key);
            return Ok(());
        }
        let expires_at = Instant::now().checked_add(Duration::from_secs(ttl_seconds));
        self.entries.insert(key.clone(), Entry { value, expires_at });
        Ok(())
    }
}

/// Counting wrapper around the memory cache, with a switch to make every
/// call fail.
#[derive(Default)]
pub struct MockDecisionCache {
    pub inner: MemoryDecisionCache,
    pub get_calls: AtomicUsize,
    pub set_calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl MockDecisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecisionCache for MockDecisionCache {
    async fn get(&self, key: &DecisionKey) -> Result<Option<bool>, ServiceError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Cache("cache unavailable".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set_with_ttl(
        &self,
        key: &DecisionKey,
        value: bool,
        ttl_seconds: u64,
    ) -> Result<(), ServiceError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Cache("cache unavailable".to_string()));
        }
        self.inner.set_with_ttl(key, value, ttl_seconds).await
    }
}

/// Build the cache selected by configuration. The memory backend gets a
/// background sweeper, so this must run inside a tokio runtime.
pub async fn build_decision_cache(
    config: &EngineConfig,
) -> Result<Arc<dyn DecisionCache>, ServiceError> {
    match config.cache.backend {
        CacheBackend::Memory => {
            let cache = Arc::new(MemoryDecisionCache::new());
            if config.cache.sweep_interval_seconds > 0 {
                cache.spawn_sweeper(Duration::from_secs(config.cache.sweep_interval_seconds));
            }
            tracing::info!("Using in-memory decision cache");
            Ok(cache)
        }
        CacheBackend::Redis => {
            let url = config.cache.redis_url.as_deref().ok_or_else(|| {
                ServiceError::Config("REDIS_URL is required for the redis backend".to_string())
            })?;
            let cache = RedisDecisionCache::new(url).await?;
            cache.health_check().await.inspect_err(|e| {
                tracing::error!(error = %e, "Decision cache Redis health check failed");
            })?;
            Ok(Arc::new(cache))
        }
    }
}
