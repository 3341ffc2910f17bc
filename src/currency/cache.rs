//! Time-bounded exchange-rate cache
//!
//! Holds one snapshot. Refreshes lazily on the first call after the freshness
//! window, with at most one upstream fetch in flight. A failed refresh falls
//! back to the previous snapshot, however old.

use crate::currency::provider::RateProvider;
use crate::error::OrchestrationError;
use crate::models::ExchangeRateSnapshot;
use crate::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Maximum age at which a snapshot is served without refreshing
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(60 * 60);

struct CachedSnapshot {
    snapshot: Arc<ExchangeRateSnapshot>,
    stored_at: Instant,
}

pub struct RateCache {
    provider: Arc<dyn RateProvider>,
    ttl: Duration,
    slot: RwLock<Option<CachedSnapshot>>,
    // held for the duration of an upstream fetch
    refresh: Mutex<()>,
    // completed upstream attempts, successful or not
    attempts: AtomicU64,
}

impl RateCache {
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self::with_ttl(provider, FRESHNESS_WINDOW)
    }

    pub fn with_ttl(provider: Arc<dyn RateProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
            attempts: AtomicU64::new(0),
        }
    }

    /// Current rates, from cache when fresh, otherwise from the provider.
    pub async fn get_rates(&self) -> Result<Arc<ExchangeRateSnapshot>> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            debug!("Using cached exchange rates");
            return Ok(snapshot);
        }

        let attempts_seen = self.attempts.load(Ordering::Acquire);
        let _refresh = self.refresh.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(snapshot) = self.fresh_snapshot().await {
            debug!("Using exchange rates refreshed by a concurrent caller");
            return Ok(snapshot);
        }

        // An attempt finished while we were queued and left no fresh snapshot,
        // so upstream just failed. Serve what we have instead of retrying.
        if self.attempts.load(Ordering::Acquire) != attempts_seen {
            if let Some(cached) = self.slot.read().await.as_ref() {
                debug!("Concurrent refresh failed, using cached exchange rates");
                return Ok(Arc::clone(&cached.snapshot));
            }
        }

        let outcome = self.provider.fetch_latest().await;
        self.attempts.fetch_add(1, Ordering::Release);

        match outcome {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.slot.write().await = Some(CachedSnapshot {
                    snapshot: Arc::clone(&snapshot),
                    stored_at: Instant::now(),
                });
                info!(currencies = snapshot.rates.len(), "Exchange rates refreshed");
                Ok(snapshot)
            }
            Err(e) => {
                if let Some(cached) = self.slot.read().await.as_ref() {
                    warn!(
                        error = %e,
                        "Failed to fetch latest exchange rates, using cached data"
                    );
                    return Ok(Arc::clone(&cached.snapshot));
                }

                Err(match e {
                    OrchestrationError::Configuration(_) | OrchestrationError::RateFetch(_) => e,
                    other => OrchestrationError::RateFetch(other.to_string()),
                })
            }
        }
    }

    async fn fresh_snapshot(&self) -> Option<Arc<ExchangeRateSnapshot>> {
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|cached| cached.stored_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.snapshot))
    }
}
