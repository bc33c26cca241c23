//! Quote Cache
//!
//! Scraping both pages takes seconds, so the last quote set is kept in memory
//! and reused for a short window.
//!
//! # Architecture
//! ```text
//! Request → Check Entry → Fresh? → Return stored set
//!              ↓
//!           Stale/empty? → Fetch all sources in parallel → Store → Return
//! ```
//!
//! # Cache Strategy
//! - TTL: 60 seconds
//! - One entry for the whole quote set
//! - A refresh where every source failed still stores an (empty) set
//! - Concurrent misses share a single refresh

use crate::{sources::QuoteSource, types::Quote};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

/// Default cache TTL (Time To Live)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Time source for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Monotonic wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Last refresh result
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<Quote>,

    /// When the refresh that produced `data` started
    timestamp: Instant,
}

/// In-memory cache in front of the quote sources
pub struct QuoteCache {
    sources: Vec<Arc<dyn QuoteSource>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,

    /// Held for the whole refresh so concurrent misses wait for it
    entry: Arc<Mutex<Option<CacheEntry>>>,
}

impl QuoteCache {
    /// Create an empty cache over `sources`
    ///
    /// Sources are reported in the order given here.
    pub fn new(sources: Vec<Arc<dyn QuoteSource>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sources,
            clock,
            ttl: DEFAULT_CACHE_TTL,
            entry: Arc::new(Mutex::new(None)),
        }
    }

    /// Set custom TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Current quote set
    ///
    /// # How it works:
    /// 1. If the stored set is younger than the TTL, return it
    /// 2. Otherwise fetch every source, store the successes, return them
    ///
    /// Never fails: if every source fails the result is empty.
    pub async fn get(&self) -> Vec<Quote> {
        let entry = self.entry.clone().lock_owned().await;

        if let Some(cached) = entry.as_ref().filter(|e| self.is_fresh(e)) {
            debug!("Returning data from cache");
            return cached.data.clone();
        }

        self.refresh_locked(entry).await
    }

    /// Fetch a fresh quote set regardless of the stored one
    pub async fn refresh(&self) -> Vec<Quote> {
        let entry = self.entry.clone().lock_owned().await;
        self.refresh_locked(entry).await
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.clock.now().saturating_duration_since(entry.timestamp) < self.ttl
    }

    /// Run the refresh as a detached task that owns the entry lock
    ///
    /// The task stores its result and releases the lock even if the caller
    /// stops waiting for it.
    async fn refresh_locked(&self, mut entry: OwnedMutexGuard<Option<CacheEntry>>) -> Vec<Quote> {
        info!("Fetching fresh data");
        let now = self.clock.now();
        let sources = self.sources.clone();

        let task = tokio::spawn(async move {
            let quotes = fetch_all(&sources).await;
            *entry = Some(CacheEntry {
                data: quotes.clone(),
                timestamp: now,
            });
            quotes
        });

        match task.await {
            Ok(quotes) => quotes,
            Err(e) => {
                error!("Refresh task failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// Fetch every source concurrently, keeping successes in source order
async fn fetch_all(sources: &[Arc<dyn QuoteSource>]) -> Vec<Quote> {
    let results = join_all(sources.iter().map(|source| source.fetch())).await;

    let quotes: Vec<Quote> = results.into_iter().flatten().collect();

    if quotes.len() < sources.len() {
        warn!(
            "Only {} of {} sources returned a quote",
            quotes.len(),
            sources.len()
        );
    }

    quotes
}

/// Clock that only moves when told to
#[cfg(test)]
pub(crate) struct ManualClock {
    start: Instant,
    offset: std::sync::Mutex<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            offset: std::sync::Mutex::new(Duration::ZERO),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }
}
