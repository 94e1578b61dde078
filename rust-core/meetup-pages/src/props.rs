// SPDX-License-Identifier: PMPL-1.0-or-later
//! Props handed from the resolver to the views.
//!
//! Identifiers are already strings here; views never see store types.

use serde::{Deserialize, Serialize};

/// One card on the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetupListItem {
    pub id: String,
    pub title: String,
    pub address: String,
    pub image: String,
}

/// Props of the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingProps {
    pub meetups: Vec<MeetupListItem>,
}

/// Props of a meetup detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetupDetailProps {
    pub id: String,
    pub title: String,
    pub address: String,
    pub image: String,
    pub description: String,
}
