//! Short-lived detection memoization with request coalescing.
//!
//! Keys coarsen the GPS fix to a grid cell so jitter from a stationary or
//! slow-moving caller lands on the same entry. Concurrent misses for one key
//! share a single in-flight computation running on its own task. Entries are
//! evicted when found expired, or by [`ResultCache::purge_expired`], never on
//! write.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;

use crate::geo::GridCell;
use crate::types::{DetectionRequest, DetectionResult};

/// Coarsened identity of a detection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    cell: GridCell,
    radius_bits: u64,
    max_alternatives: usize,
}

impl CacheKey {
    #[must_use]
    pub fn for_request(request: &DetectionRequest, cell_meters: f64) -> Self {
        Self {
            cell: GridCell::containing(request.point, cell_meters),
            radius_bits: request.radius_km.to_bits(),
            max_alternatives: request.max_alternatives,
        }
    }
}

type SharedDetection = Shared<BoxFuture<'static, Option<DetectionResult>>>;
type Entries = Mutex<HashMap<CacheKey, Slot>>;

enum Slot {
    Ready {
        result: DetectionResult,
        expires_at: Instant,
    },
    InFlight(SharedDetection),
}

pub struct ResultCache {
    ttl: Duration,
    cell_meters: f64,
    entries: Arc<Entries>,
}

impl ResultCache {
    #[must_use]
    pub fn new(ttl: Duration, cell_meters: f64) -> Self {
        Self {
            ttl,
            cell_meters,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn key_for(&self, request: &DetectionRequest) -> CacheKey {
        CacheKey::for_request(request, self.cell_meters)
    }

    /// Return the cached result for `key`, join an in-flight computation for
    /// it, or start `compute` and share it with later callers.
    ///
    /// The computation runs on its own task and publishes its result even if
    /// every caller has gone away, so an abandoned key never stays in flight.
    /// Results served from the cache or from another caller's computation
    /// come back with `cached = true`. Results carrying an error are returned
    /// but not retained.
    ///
    /// Returns `None` only if the computation task panicked or was aborted.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: CacheKey,
        compute: F,
    ) -> Option<DetectionResult>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DetectionResult> + Send + 'static,
    {
        let (shared, leader) = {
            let mut entries = lock(&self.entries);
            let now = Instant::now();

            match entries.get(&key) {
                Some(Slot::Ready { result, expires_at }) if *expires_at > now => {
                    tracing::debug!(?key, "detection cache hit");
                    return Some(as_cached(result.clone()));
                }
                Some(Slot::InFlight(shared)) => {
                    tracing::debug!(?key, "joining in-flight detection");
                    (shared.clone(), false)
                }
                _ => {
                    let shared = self.spawn_computation(key, compute());
                    entries.insert(key, Slot::InFlight(shared.clone()));
                    (shared, true)
                }
            }
        };

        let result = shared.await?;
        Some(if leader { result } else { as_cached(result) })
    }

    /// Drop every expired entry. In-flight computations are kept; they
    /// always settle on their own task.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|_, slot| match slot {
            Slot::Ready { expires_at, .. } => *expires_at > now,
            Slot::InFlight(_) => true,
        });
        before - entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    fn spawn_computation<Fut>(&self, key: CacheKey, compute: Fut) -> SharedDetection
    where
        Fut: Future<Output = DetectionResult> + Send + 'static,
    {
        let entries = Arc::clone(&self.entries);
        let ttl = self.ttl;
        let task = tokio::spawn(async move {
            match AssertUnwindSafe(compute).catch_unwind().await {
                Ok(result) => {
                    complete(&entries, key, ttl, &result);
                    Some(result)
                }
                Err(_) => {
                    tracing::error!(?key, "detection computation panicked");
                    abandon(&entries, key);
                    None
                }
            }
        });

        async move {
            task.await.unwrap_or_else(|e| {
                tracing::error!(?key, error = %e, "detection task did not complete");
                None
            })
        }
        .boxed()
        .shared()
    }
}

/// Publish a finished computation, replacing its in-flight slot.
fn complete(entries: &Entries, key: CacheKey, ttl: Duration, result: &DetectionResult) {
    let mut entries = lock(entries);
    if !matches!(entries.get(&key), Some(Slot::InFlight(_)) | None) {
        return;
    }

    if result.error.is_some() {
        entries.remove(&key);
        return;
    }

    entries.insert(
        key,
        Slot::Ready {
            result: result.clone(),
            expires_at: Instant::now() + ttl,
        },
    );
}

/// Clear the in-flight slot of a computation that produced nothing.
fn abandon(entries: &Entries, key: CacheKey) {
    let mut entries = lock(entries);
    if matches!(entries.get(&key), Some(Slot::InFlight(_))) {
        entries.remove(&key);
    }
}

fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

fn as_cached(mut result: DetectionResult) -> DetectionResult {
    result.cached = true;
    result
}
