// SPDX-License-Identifier: PMPL-1.0-or-later
//! Meetup record store client.

use tracing::{debug, info, instrument};

use crate::model::IdProjection;
use crate::{MeetupDocument, MeetupId, MeetupSummary, NewMeetup, StorePool, StoreError};

/// Name of the collection holding meetup documents.
pub const COLLECTION: &str = "meetups";

/// Client for the meetups collection.
///
/// Each call acquires its own connection and releases it before returning;
/// nothing is held between calls.
#[derive(Debug, Clone)]
pub struct MeetupStore {
    pool: StorePool,
}

impl MeetupStore {
    pub fn new(pool: StorePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &StorePool {
        &self.pool
    }

    /// Every meetup, listing projection, in insertion order.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<MeetupSummary>, StoreError> {
        let conn = self.pool.acquire().await?;
        let meetups: Vec<MeetupSummary> = conn.collection(COLLECTION).find_all().await?;

        debug!(count = meetups.len(), "listed meetups");
        Ok(meetups)
    }

    /// Ids of every meetup in the collection, in insertion order.
    ///
    /// Documents without an id are skipped.
    #[instrument(skip(self))]
    pub async fn list_ids(&self) -> Result<Vec<MeetupId>, StoreError> {
        let conn = self.pool.acquire().await?;
        let rows: Vec<IdProjection> = conn.collection(COLLECTION).find_all().await?;

        Ok(rows.into_iter().filter_map(|row| row.id).collect())
    }

    /// Fetch one meetup by its hex id.
    ///
    /// A malformed id fails with [`StoreError::InvalidIdentifier`] without
    /// touching the store.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<MeetupDocument, StoreError> {
        let id = MeetupId::parse(id)?;

        let conn = self.pool.acquire().await?;
        conn.collection(COLLECTION)
            .find_one::<MeetupDocument>(&id.to_hex())
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_hex()))
    }

    /// Validate and insert a new meetup, returning its assigned id.
    ///
    /// The document is written with a single insert-if-absent, so it either
    /// exists in full afterwards or not at all.
    #[instrument(skip(self, meetup), fields(title = %meetup.title))]
    pub async fn insert(&self, meetup: NewMeetup) -> Result<MeetupId, StoreError> {
        meetup.validate()?;

        let id = MeetupId::generate();
        let document = meetup.into_document(id);

        let conn = self.pool.acquire().await?;
        conn.collection(COLLECTION)
            .insert_one(&id.to_hex(), &document)
            .await?;

        info!(%id, "meetup inserted");
        Ok(id)
    }
}
