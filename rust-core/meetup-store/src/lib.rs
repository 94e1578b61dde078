// SPDX-License-Identifier: PMPL-1.0-or-later
//! Meetup Record Store
//!
//! Client for the `meetups` document collection. Every operation checks a
//! connection out of a [`StorePool`], runs one query against it and hands the
//! connection back before returning, on success and on error alike.

mod error;
mod id;
mod model;
mod pool;
mod store;

pub use error::StoreError;
pub use id::MeetupId;
pub use model::{MeetupDocument, MeetupSummary, NewMeetup};
pub use pool::{Connection, PoolConfig, StorePool};
pub use store::{MeetupStore, COLLECTION};
