// SPDX-License-Identifier: PMPL-1.0-or-later
//! Per-id detail page cache with a fallback policy.
//!
//! Ids enumerated at build time are pre-generated. What happens to any
//! other id is decided by [`FallbackMode`]: `Closed` answers not-found
//! without touching the source, `Blocking` generates the page on first
//! request and caches it. Concurrent first requests for the same id share
//! one generation. Not-found outcomes and failures are never cached.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::{FallbackMode, PageError, RenderedPage, Resolution};

/// Produces the page for one route parameter.
#[async_trait]
pub trait DynamicPageSource: Send + Sync {
    async fn render(&self, param: &str) -> Result<Resolution<RenderedPage>, PageError>;
}

/// Cache of detail pages keyed by route parameter.
pub struct DetailPages {
    fallback: FallbackMode,
    source: Arc<dyn DynamicPageSource>,
    pages: RwLock<HashMap<String, Arc<RenderedPage>>>,
    inflight: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for DetailPages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailPages")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl DetailPages {
    pub fn new(fallback: FallbackMode, source: Arc<dyn DynamicPageSource>) -> Self {
        Self {
            fallback,
            source,
            pages: RwLock::new(HashMap::new()),
            inflight: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn fallback(&self) -> FallbackMode {
        self.fallback
    }

    /// Generate pages for the build-time id set and return how many were
    /// generated. An enumerated id whose page resolves to not-found is
    /// skipped.
    #[instrument(skip(self, ids))]
    pub async fn prerender<I>(&self, ids: I) -> Result<usize, PageError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut generated = 0;
        for id in ids {
            match self.source.render(&id).await? {
                Resolution::Found(page) => {
                    self.pages.write().await.insert(id, Arc::new(page));
                    generated += 1;
                }
                Resolution::NotFound => {
                    warn!(id = %id, "enumerated id has no page");
                }
            }
        }
        info!(generated, "detail pages pre-rendered");
        Ok(generated)
    }

    /// Serve the page for `id`, applying the fallback policy.
    pub async fn serve(&self, id: &str) -> Result<Resolution<Arc<RenderedPage>>, PageError> {
        if let Some(page) = self.cached(id).await {
            return Ok(Resolution::Found(page));
        }

        if self.fallback == FallbackMode::Closed {
            debug!(id, "id outside build-time set, fallback closed");
            return Ok(Resolution::NotFound);
        }

        let slot = self.inflight_slot(id);
        let _running = slot.lock.lock().await;
        // A concurrent request may have finished generating it.
        if let Some(page) = self.cached(id).await {
            return Ok(Resolution::Found(page));
        }
        self.generate(id).await
    }

    /// Whether a page for `id` is cached.
    pub async fn contains(&self, id: &str) -> bool {
        self.pages.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pages.read().await.is_empty()
    }

    async fn cached(&self, id: &str) -> Option<Arc<RenderedPage>> {
        self.pages.read().await.get(id).cloned()
    }

    async fn generate(&self, id: &str) -> Result<Resolution<Arc<RenderedPage>>, PageError> {
        match self.source.render(id).await? {
            Resolution::Found(page) => {
                let page = Arc::new(page);
                self.pages.write().await.insert(id.to_string(), page.clone());
                info!(id, "detail page generated on demand");
                Ok(Resolution::Found(page))
            }
            Resolution::NotFound => Ok(Resolution::NotFound),
        }
    }

    fn inflight_slot<'a>(&'a self, id: &'a str) -> InflightSlot<'a> {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = inflight
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        InflightSlot {
            pages: self,
            id,
            lock,
        }
    }
}

/// One request's share of the per-id generation lock.
///
/// The entry leaves the in-flight map when the last share is dropped,
/// whether the request finished or its future was cancelled.
struct InflightSlot<'a> {
    pages: &'a DetailPages,
    id: &'a str,
    lock: Arc<Mutex<()>>,
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        let mut inflight = self
            .pages
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Held by the map and this slot only.
        let last = inflight
            .get(self.id)
            .is_some_and(|l| Arc::ptr_eq(l, &self.lock) && Arc::strong_count(l) == 2);
        if last {
            inflight.remove(self.id);
        }
    }
}
