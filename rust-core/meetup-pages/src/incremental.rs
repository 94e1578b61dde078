// SPDX-License-Identifier: PMPL-1.0-or-later
//! Stale-while-revalidate page cache.
//!
//! An [`IncrementalPage`] holds one generated page. Within the revalidation
//! window it is served as is. After the window, the first request starts a
//! background regeneration and every request, including that one, gets the
//! stale page until the new one replaces it. At most one regeneration runs
//! at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::{PageError, RenderedPage};

/// Produces a fresh rendering of a page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn render(&self) -> Result<RenderedPage, PageError>;
}

/// Observable state of an [`IncrementalPage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Never generated.
    Missing,
    /// Generated within the revalidation window.
    Fresh,
    /// Past the window, no regeneration running.
    Stale,
    /// Past the window, regeneration in progress.
    Regenerating,
}

struct CachedPage {
    page: Arc<RenderedPage>,
    generated_at: Instant,
}

/// Resets the regeneration flag when the regeneration ends, however it ends.
struct RegenerationGuard(Arc<AtomicBool>);

impl Drop for RegenerationGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A page regenerated in the background once its window has elapsed.
pub struct IncrementalPage {
    name: String,
    revalidate: Duration,
    source: Arc<dyn PageSource>,
    cached: RwLock<Option<CachedPage>>,
    regenerating: Arc<AtomicBool>,
    initial: Mutex<()>,
}

impl std::fmt::Debug for IncrementalPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalPage")
            .field("name", &self.name)
            .field("revalidate", &self.revalidate)
            .field("regenerating", &self.regenerating.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl IncrementalPage {
    pub fn new(name: impl Into<String>, revalidate: Duration, source: Arc<dyn PageSource>) -> Self {
        Self {
            name: name.into(),
            revalidate,
            source,
            cached: RwLock::new(None),
            regenerating: Arc::new(AtomicBool::new(false)),
            initial: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn revalidate(&self) -> Duration {
        self.revalidate
    }

    /// Generate the page now, replacing whatever is cached.
    ///
    /// Used at build time. On failure the cache is left untouched.
    #[instrument(skip(self), fields(page = %self.name))]
    pub async fn generate(&self) -> Result<Arc<RenderedPage>, PageError> {
        let page = Arc::new(self.source.render().await?);
        self.store(page.clone()).await;
        info!("page generated");
        Ok(page)
    }

    /// Serve the page.
    ///
    /// Only the very first request, before anything was generated, waits on
    /// generation. Every later request returns immediately with the cached
    /// page.
    pub async fn serve(self: &Arc<Self>) -> Result<Arc<RenderedPage>, PageError> {
        if let Some((page, fresh)) = self.peek().await {
            if !fresh {
                self.trigger_regeneration();
            }
            return Ok(page);
        }

        let _initial = self.initial.lock().await;
        // Another request may have generated it while we waited.
        if let Some((page, _)) = self.peek().await {
            return Ok(page);
        }
        self.generate().await
    }

    pub async fn state(&self) -> PageState {
        match self.peek().await {
            None => PageState::Missing,
            Some((_, true)) => PageState::Fresh,
            Some((_, false)) if self.regenerating.load(Ordering::Acquire) => {
                PageState::Regenerating
            }
            Some((_, false)) => PageState::Stale,
        }
    }

    async fn peek(&self) -> Option<(Arc<RenderedPage>, bool)> {
        let cached = self.cached.read().await;
        cached.as_ref().map(|c| {
            let fresh = c.generated_at.elapsed() < self.revalidate;
            (c.page.clone(), fresh)
        })
    }

    async fn store(&self, page: Arc<RenderedPage>) {
        *self.cached.write().await = Some(CachedPage {
            page,
            generated_at: Instant::now(),
        });
    }

    fn trigger_regeneration(self: &Arc<Self>) {
        if self
            .regenerating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(page = %self.name, "regeneration already in progress");
            return;
        }

        let guard = RegenerationGuard(self.regenerating.clone());
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = guard;
            // A request that saw the page stale can arrive here after
            // another regeneration already replaced it.
            if let Some((_, true)) = this.peek().await {
                debug!(page = %this.name, "page already fresh, skipping regeneration");
                return;
            }
            match this.source.render().await {
                Ok(page) => {
                    this.store(Arc::new(page)).await;
                    info!(page = %this.name, "page regenerated");
                }
                Err(e) => {
                    warn!(page = %this.name, error = %e, "regeneration failed, keeping stale page");
                }
            }
        });
    }
}
