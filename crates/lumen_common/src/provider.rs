//! Provider fallback coordinator.
//!
//! A small trait over data sources plus a priority-sorted registry with a TTL
//! cache in front. Sports runs several real providers per league key; weather
//! and web search are single-provider instances of the same pattern.
//!
//! Per-provider failures are logged and the next provider is tried. Only when
//! the chain is exhausted does the last error reach the caller.

use crate::cache::{TtlCache, DEFAULT_CAPACITY, DEFAULT_TTL};
use crate::error::{AugmentError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, warn};

// ============================================================================
// Provider Trait
// ============================================================================

/// A pluggable data source for one domain
#[async_trait]
pub trait Provider: Send + Sync {
    type Output: Clone + Send + Sync + 'static;

    fn name(&self) -> &str;

    /// Lower is tried first
    fn priority(&self) -> u32;

    /// Whether this provider can serve `key` at all (e.g. a league it covers)
    fn supports(&self, key: &str) -> bool;

    /// Cheap readiness check, e.g. credentials present
    async fn is_available(&self) -> bool;

    async fn fetch(&self, key: &str) -> Result<Self::Output>;
}

/// A provider result with attribution
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub provider: String,
    pub from_cache: bool,
}

// ============================================================================
// Fallback Coordinator
// ============================================================================

pub struct FallbackCoordinator<T: Clone + Send + Sync + 'static> {
    domain: String,
    providers: RwLock<Vec<Arc<dyn Provider<Output = T>>>>,
    cache: AsyncMutex<TtlCache<T>>,
    /// Held from cache lookup to write-through so overlapping misses queue
    in_flight: AsyncMutex<()>,
}

impl<T: Clone + Send + Sync + 'static> FallbackCoordinator<T> {
    pub fn new(domain: impl Into<String>) -> Self {
        Self::with_cache(domain, DEFAULT_TTL, DEFAULT_CAPACITY)
    }

    pub fn with_cache(domain: impl Into<String>, ttl: Duration, capacity: usize) -> Self {
        Self {
            domain: domain.into(),
            providers: RwLock::new(Vec::new()),
            cache: AsyncMutex::new(TtlCache::new(ttl, capacity)),
            in_flight: AsyncMutex::new(()),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Add a provider and keep the list sorted by priority.
    ///
    /// Cached results from providers that now rank below the newcomer are
    /// dropped so the better source is consulted on the next read.
    pub async fn register(&self, provider: Arc<dyn Provider<Output = T>>) {
        let priority = provider.priority();
        let outranked: Vec<String> = {
            let mut providers = self.providers.write().await;
            let outranked = providers
                .iter()
                .filter(|p| p.priority() > priority)
                .map(|p| p.name().to_string())
                .collect();
            providers.push(provider.clone());
            providers.sort_by_key(|p| p.priority());
            outranked
        };

        let mut cache = self.cache.lock().await;
        let evicted: usize = outranked.iter().map(|n| cache.evict_provider(n)).sum();
        info!(
            "[{}] registered provider {} (priority {}), evicted {} cached entries",
            self.domain,
            provider.name(),
            priority,
            evicted
        );
    }

    /// Provider names in the order they are tried
    pub async fn providers(&self) -> Vec<String> {
        self.providers
            .read()
            .await
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}:{}", self.domain, key)
    }

    /// Fetch `key`, serving a fresh cache entry or walking the provider chain.
    ///
    /// Calls on one coordinator run one at a time, so a second caller for the
    /// same key sees the first caller's result in the cache.
    pub async fn fetch(&self, key: &str) -> Result<Fetched<T>> {
        let _in_flight = self.in_flight.lock().await;
        let cache_key = self.cache_key(key);

        if let Some(entry) = self.cache.lock().await.get(&cache_key) {
            debug!("[{}] cache hit for {} ({})", self.domain, key, entry.provider);
            return Ok(Fetched {
                value: entry.value,
                provider: entry.provider,
                from_cache: true,
            });
        }

        let providers: Vec<_> = self.providers.read().await.clone();
        let mut last_error: Option<AugmentError> = None;

        for provider in providers {
            if !provider.supports(key) {
                debug!("[{}] {} does not support {}", self.domain, provider.name(), key);
                continue;
            }
            if !provider.is_available().await {
                debug!("[{}] {} unavailable", self.domain, provider.name());
                continue;
            }

            match provider.fetch(key).await {
                Ok(value) => {
                    info!("[{}] {} served {}", self.domain, provider.name(), key);
                    self.cache
                        .lock()
                        .await
                        .insert(cache_key, value.clone(), provider.name());
                    return Ok(Fetched {
                        value,
                        provider: provider.name().to_string(),
                        from_cache: false,
                    });
                }
                Err(e) => {
                    warn!("[{}] {} failed for {}: {}", self.domain, provider.name(), key, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(AugmentError::NoResults))
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn clear_cache_for(&self, key: &str) {
        let cache_key = self.cache_key(key);
        self.cache.lock().await.remove(&cache_key);
    }
}

// ============================================================================
// Fake Provider (Testing)
// ============================================================================

/// Scripted outcome for a fake provider
#[derive(Debug, Clone)]
pub enum FakeOutcome<T> {
    Value(T),
    Fail(String),
}

/// Fake provider for deterministic tests. Counts every `fetch`.
pub struct FakeProvider<T> {
    name: String,
    priority: u32,
    supported: Option<Vec<String>>,
    available: bool,
    outcome: Mutex<FakeOutcome<T>>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl<T: Clone + Send + Sync + 'static> FakeProvider<T> {
    pub fn returning(name: &str, priority: u32, value: T) -> Self {
        Self {
            name: name.to_string(),
            priority,
            supported: None,
            available: true,
            outcome: Mutex::new(FakeOutcome::Value(value)),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(name: &str, priority: u32, message: &str) -> Self {
        Self {
            name: name.to_string(),
            priority,
            supported: None,
            available: true,
            outcome: Mutex::new(FakeOutcome::Fail(message.to_string())),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Restrict to the given keys
    pub fn supporting(mut self, keys: &[&str]) -> Self {
        self.supported = Some(keys.iter().map(|k| k.to_string()).collect());
        self
    }

    /// Sleep this long inside every fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn set_outcome(&self, outcome: FakeOutcome<T>) {
        if let Ok(mut guard) = self.outcome.lock() {
            *guard = outcome;
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Provider for FakeProvider<T> {
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn supports(&self, key: &str) -> bool {
        self.supported
            .as_ref()
            .map(|keys| keys.iter().any(|k| k == key))
            .unwrap_or(true)
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn fetch(&self, _key: &str) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let outcome = self
            .outcome
            .lock()
            .map(|g| g.clone())
            .map_err(|_| AugmentError::Provider("fake outcome poisoned".to_string()))?;
        match outcome {
            FakeOutcome::Value(v) => Ok(v),
            FakeOutcome::Fail(message) => Err(AugmentError::Provider(message)),
        }
    }
}
