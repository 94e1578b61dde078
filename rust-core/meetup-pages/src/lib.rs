// SPDX-License-Identifier: PMPL-1.0-or-later
//! Meetup Pages
//!
//! Static generation for the meetup site. The [`resolver`] turns store
//! records into page props, [`render`] turns props into HTML, and two page
//! caches decide when that work reruns:
//!
//! - [`IncrementalPage`] keeps the listing page, serving it stale while a
//!   single background regeneration refreshes it.
//! - [`DetailPages`] keeps one page per meetup id, pre-generated for the ids
//!   known at build time, with a [`FallbackMode`] for ids outside that set.
//!
//! [`Site`] wires all of it to a [`meetup_store::MeetupStore`].

pub mod config;
pub mod error;
pub mod fallback;
pub mod incremental;
pub mod page;
pub mod props;
pub mod render;
pub mod resolver;
pub mod site;

pub use config::{FallbackMode, RegenerationConfig};
pub use error::PageError;
pub use fallback::{DetailPages, DynamicPageSource};
pub use incremental::{IncrementalPage, PageSource, PageState};
pub use page::{RenderedPage, Resolution};
pub use props::{ListingProps, MeetupDetailProps, MeetupListItem};
pub use resolver::PageResolver;
pub use site::{BuildReport, Site};
