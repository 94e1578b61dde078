// SPDX-License-Identifier: PMPL-1.0-or-later
//! Page data resolution.
//!
//! Maps store documents to the props each page needs. Store errors are not
//! swallowed here; only "no such record" becomes [`Resolution::NotFound`].

use std::sync::Arc;

use meetup_store::{MeetupStore, StoreError};
use tracing::{debug, warn};

use crate::{ListingProps, MeetupDetailProps, MeetupListItem, PageError, Resolution};

/// Resolves page props from the meetup store.
#[derive(Debug, Clone)]
pub struct PageResolver {
    store: Arc<MeetupStore>,
}

impl PageResolver {
    pub fn new(store: Arc<MeetupStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MeetupStore {
        &self.store
    }

    /// Props for the listing page: every meetup, ids as strings.
    ///
    /// A document without an id cannot be linked to, so it is left out.
    pub async fn listing_props(&self) -> Result<ListingProps, PageError> {
        let summaries = self.store.list_all().await?;

        let meetups = summaries
            .into_iter()
            .filter_map(|summary| match summary.id {
                Some(id) => Some(MeetupListItem {
                    id: id.to_hex(),
                    title: summary.title,
                    address: summary.address,
                    image: summary.image,
                }),
                None => {
                    warn!(title = %summary.title, "skipping meetup document without an id");
                    None
                }
            })
            .collect();

        Ok(ListingProps { meetups })
    }

    /// Props for the detail page of `meetup_id`.
    ///
    /// A missing record and a record without an id both resolve to
    /// [`Resolution::NotFound`]. A malformed id is an error.
    pub async fn detail_props(
        &self,
        meetup_id: &str,
    ) -> Result<Resolution<MeetupDetailProps>, PageError> {
        let document = match self.store.get_by_id(meetup_id).await {
            Ok(document) => document,
            Err(StoreError::NotFound(_)) => {
                debug!(meetup_id, "no meetup for detail page");
                return Ok(Resolution::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        let Some(id) = document.id else {
            warn!(meetup_id, "store returned a meetup document without an id");
            return Ok(Resolution::NotFound);
        };

        Ok(Resolution::Found(MeetupDetailProps {
            id: id.to_hex(),
            title: document.title,
            address: document.address,
            image: document.image,
            description: document.description,
        }))
    }

    /// Detail paths to pre-generate at build time.
    pub async fn static_paths(&self) -> Result<Vec<String>, PageError> {
        let ids = self.store.list_ids().await?;
        Ok(ids.into_iter().map(|id| id.to_hex()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetup_storage::{InMemoryBackend, StorageBackend};
    use meetup_store::{MeetupId, NewMeetup, PoolConfig, StorePool};

    fn resolver_with_backend() -> (PageResolver, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::new());
        let pool = StorePool::with_backend(backend.clone(), PoolConfig::default());
        (PageResolver::new(Arc::new(MeetupStore::new(pool))), backend)
    }

    async fn seed_raw(backend: &InMemoryBackend, key: &MeetupId, json: &str) {
        let key = format!("meetups:{}", key.to_hex());
        assert!(backend.insert_if_absent(key.as_bytes(), json.as_bytes()).await.unwrap());
    }

    #[tokio::test]
    async fn test_listing_props_shape() {
        let (resolver, _) = resolver_with_backend();
        let id = resolver
            .store()
            .insert(NewMeetup::new("A", "u1", "addr1", "d1"))
            .await
            .unwrap();

        let props = resolver.listing_props().await.unwrap();
        assert_eq!(
            props.meetups,
            vec![MeetupListItem {
                id: id.to_hex(),
                title: "A".to_string(),
                address: "addr1".to_string(),
                image: "u1".to_string(),
            }]
        );

        // Ids reach the view as plain strings; description stays out.
        let json = serde_json::to_value(&props).unwrap();
        assert!(json["meetups"][0]["id"].is_string());
        assert!(json["meetups"][0].get("description").is_none());
    }

    #[tokio::test]
    async fn test_listing_skips_documents_without_id() {
        let (resolver, backend) = resolver_with_backend();
        resolver
            .store()
            .insert(NewMeetup::new("kept", "u1", "addr1", "d1"))
            .await
            .unwrap();
        seed_raw(
            &backend,
            &MeetupId::generate(),
            r#"{"title":"orphan","image":"u2","address":"a2","description":"d2"}"#,
        )
        .await;

        let props = resolver.listing_props().await.unwrap();
        let titles: Vec<&str> = props.meetups.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["kept"]);
    }

    #[tokio::test]
    async fn test_detail_props_found() {
        let (resolver, _) = resolver_with_backend();
        let id = resolver
            .store()
            .insert(NewMeetup::new("A", "u1", "addr1", "d1"))
            .await
            .unwrap();

        let props = resolver.detail_props(&id.to_hex()).await.unwrap();
        assert_eq!(
            props,
            Resolution::Found(MeetupDetailProps {
                id: id.to_hex(),
                title: "A".to_string(),
                address: "addr1".to_string(),
                image: "u1".to_string(),
                description: "d1".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_detail_props_unknown_id_is_not_found() {
        let (resolver, _) = resolver_with_backend();
        let props = resolver
            .detail_props(&MeetupId::generate().to_hex())
            .await
            .unwrap();
        assert_eq!(props, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_detail_props_document_without_id_is_not_found() {
        let (resolver, backend) = resolver_with_backend();
        let key = MeetupId::generate();
        seed_raw(
            &backend,
            &key,
            r#"{"title":"orphan","image":"u2","address":"a2","description":"d2"}"#,
        )
        .await;

        let props = resolver.detail_props(&key.to_hex()).await.unwrap();
        assert_eq!(props, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_detail_props_malformed_id_is_an_error() {
        let (resolver, _) = resolver_with_backend();
        let result = resolver.detail_props("not-a-valid-id-format").await;
        assert!(matches!(
            result,
            Err(PageError::Store(StoreError::InvalidIdentifier(_)))
        ));
    }

    #[tokio::test]
    async fn test_static_paths_enumerate_ids() {
        let (resolver, _) = resolver_with_backend();
        let a = resolver
            .store()
            .insert(NewMeetup::new("a", "u", "addr", "d"))
            .await
            .unwrap();
        let b = resolver
            .store()
            .insert(NewMeetup::new("b", "u", "addr", "d"))
            .await
            .unwrap();

        assert_eq!(
            resolver.static_paths().await.unwrap(),
            vec![a.to_hex(), b.to_hex()]
        );
    }
}
