// SPDX-License-Identifier: PMPL-1.0-or-later
//! The meetup site: listing, detail pages and the static form page.

use std::sync::Arc;

use async_trait::async_trait;
use meetup_store::{MeetupId, MeetupStore};
use tracing::{info, instrument};

use crate::incremental::{IncrementalPage, PageSource};
use crate::render;
use crate::{
    DetailPages, DynamicPageSource, PageError, PageResolver, RegenerationConfig, RenderedPage,
    Resolution,
};

/// Summary of a site build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Number of meetups on the generated listing page.
    pub listing_count: usize,
    /// Number of pre-generated detail pages.
    pub detail_pages: usize,
}

struct ListingSource {
    resolver: PageResolver,
}

#[async_trait]
impl PageSource for ListingSource {
    async fn render(&self) -> Result<RenderedPage, PageError> {
        let props = self.resolver.listing_props().await?;
        render::listing_page(&props)
    }
}

struct DetailSource {
    resolver: PageResolver,
}

#[async_trait]
impl DynamicPageSource for DetailSource {
    async fn render(&self, param: &str) -> Result<Resolution<RenderedPage>, PageError> {
        match self.resolver.detail_props(param).await? {
            Resolution::Found(props) => render::detail_page(&props).map(Resolution::Found),
            Resolution::NotFound => Ok(Resolution::NotFound),
        }
    }
}

/// All pages of the site, backed by one store.
#[derive(Debug)]
pub struct Site {
    resolver: PageResolver,
    config: RegenerationConfig,
    listing: Arc<IncrementalPage>,
    details: DetailPages,
    new_meetup: String,
    not_found: String,
}

impl Site {
    pub fn new(store: Arc<MeetupStore>, config: RegenerationConfig) -> Self {
        let resolver = PageResolver::new(store);
        let listing = Arc::new(IncrementalPage::new(
            "listing",
            config.revalidate,
            Arc::new(ListingSource {
                resolver: resolver.clone(),
            }),
        ));
        let details = DetailPages::new(
            config.fallback,
            Arc::new(DetailSource {
                resolver: resolver.clone(),
            }),
        );

        Self {
            resolver,
            config,
            listing,
            details,
            new_meetup: render::new_meetup_page(),
            not_found: render::not_found_page(),
        }
    }

    pub fn config(&self) -> &RegenerationConfig {
        &self.config
    }

    pub fn resolver(&self) -> &PageResolver {
        &self.resolver
    }

    /// Generate the listing page and every enumerable detail page.
    #[instrument(skip(self))]
    pub async fn build(&self) -> Result<BuildReport, PageError> {
        let listing = self.listing.generate().await?;
        let listing_count = listing.props["meetups"].as_array().map_or(0, Vec::len);

        let paths = self.resolver.static_paths().await?;
        let detail_pages = self.details.prerender(paths).await?;

        let report = BuildReport {
            listing_count,
            detail_pages,
        };
        info!(
            listing_count = report.listing_count,
            detail_pages = report.detail_pages,
            revalidate_secs = self.config.revalidate.as_secs(),
            fallback = %self.config.fallback,
            "site built"
        );
        Ok(report)
    }

    /// The listing page, possibly stale while it regenerates.
    pub async fn listing(&self) -> Result<Arc<RenderedPage>, PageError> {
        self.listing.serve().await
    }

    /// The detail page of `meetup_id`, subject to the fallback policy.
    ///
    /// Every spelling of an id shares one cache entry, so hex case never
    /// decides between a cached page and a not-found. A malformed id is an
    /// error under either fallback.
    pub async fn detail(&self, meetup_id: &str) -> Result<Resolution<Arc<RenderedPage>>, PageError> {
        let id = MeetupId::parse(meetup_id)?.to_hex();
        self.details.serve(&id).await
    }

    pub fn listing_page(&self) -> &IncrementalPage {
        &self.listing
    }

    pub fn detail_pages(&self) -> &DetailPages {
        &self.details
    }

    pub fn new_meetup_page(&self) -> &str {
        &self.new_meetup
    }

    pub fn not_found_page(&self) -> &str {
        &self.not_found
    }
}
