// SPDX-License-Identifier: PMPL-1.0-or-later
//! Connection pool for the document store.
//!
//! The pool owns the storage backend and a semaphore bounding how many
//! operations may use it at once. A [`Connection`] is a guard: dropping it
//! returns its slot to the pool, so every exit path of an operation releases
//! the connection, including early returns through `?`.

use std::sync::Arc;
use std::time::Duration;

use meetup_storage::{Collection, InMemoryBackend, StorageBackend};
use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use crate::StoreError;

const MEMORY_SCHEME: &str = "memory://";
#[cfg(feature = "redb-backend")]
const REDB_SCHEME: &str = "redb://";

/// Pool sizing and acquisition limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of connections checked out at the same time
    pub max_connections: usize,
    /// How long `acquire` waits for a free connection before failing
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// A bounded pool of connections to one storage backend.
///
/// Cloning the pool is cheap and every clone draws from the same slots.
#[derive(Clone)]
pub struct StorePool {
    backend: Arc<dyn StorageBackend>,
    slots: Arc<Semaphore>,
    config: PoolConfig,
}

impl std::fmt::Debug for StorePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorePool")
            .field("backend", &self.backend.name())
            .field("available", &self.slots.available_permits())
            .field("config", &self.config)
            .finish()
    }
}

impl StorePool {
    /// Open a pool from a connection string.
    ///
    /// Supported schemes are `memory://` and, with the `redb-backend`
    /// feature, `redb://<path>`.
    pub fn connect(url: &str, config: PoolConfig) -> Result<Self, StoreError> {
        if url.starts_with(MEMORY_SCHEME) {
            return Ok(Self::with_backend(Arc::new(InMemoryBackend::new()), config));
        }

        #[cfg(feature = "redb-backend")]
        {
            if let Some(path) = url.strip_prefix(REDB_SCHEME) {
                let backend = meetup_storage::RedbBackend::open(path)?;
                return Ok(Self::with_backend(Arc::new(backend), config));
            }
        }

        Err(StoreError::Connection(format!(
            "unsupported connection scheme in '{}'",
            url
        )))
    }

    /// Build a pool around an already opened backend.
    pub fn with_backend(backend: Arc<dyn StorageBackend>, config: PoolConfig) -> Self {
        info!(
            backend = backend.name(),
            max_connections = config.max_connections,
            "opened store pool"
        );
        Self {
            slots: Arc::new(Semaphore::new(config.max_connections)),
            backend,
            config,
        }
    }

    /// Check out a connection, waiting up to `acquire_timeout` for a slot.
    pub async fn acquire(&self) -> Result<Connection, StoreError> {
        let slot = tokio::time::timeout(
            self.config.acquire_timeout,
            Arc::clone(&self.slots).acquire_owned(),
        )
        .await
        .map_err(|_| {
            StoreError::Connection(format!(
                "no connection available within {:?}",
                self.config.acquire_timeout
            ))
        })?
        .map_err(|_| StoreError::Connection("store pool is closed".to_string()))?;

        debug!(available = self.slots.available_permits(), "connection acquired");

        Ok(Connection {
            backend: Arc::clone(&self.backend),
            _slot: slot,
        })
    }

    /// Close the pool. Connections already checked out stay usable; every
    /// later `acquire` fails with [`StoreError::Connection`].
    pub fn close(&self) {
        self.slots.close();
        info!(backend = self.backend.name(), "store pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }

    /// Number of connections that could be checked out right now.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}

/// A checked-out connection. Its pool slot is released on drop.
pub struct Connection {
    backend: Arc<dyn StorageBackend>,
    _slot: OwnedSemaphorePermit,
}

impl Connection {
    /// Handle on a named collection reached through this connection.
    pub fn collection(&self, name: &str) -> Collection {
        Collection::new(Arc::clone(&self.backend), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool(max_connections: usize) -> StorePool {
        StorePool::connect(
            "memory://",
            PoolConfig {
                max_connections,
                acquire_timeout: Duration::from_millis(50),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_connection_released_on_drop() {
        let pool = small_pool(2);
        assert_eq!(pool.available(), 2);

        let conn = pool.acquire().await.unwrap();
        assert_eq!(pool.available(), 1);

        drop(conn);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_times_out_when_exhausted() {
        let pool = small_pool(1);
        let _held = pool.acquire().await.unwrap();

        match pool.acquire().await {
            Err(StoreError::Connection(msg)) => assert!(msg.contains("no connection available")),
            other => panic!("expected Connection error, got: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_closed_pool_refuses_connections() {
        let pool = small_pool(1);
        pool.close();
        assert!(pool.is_closed());

        match pool.acquire().await {
            Err(StoreError::Connection(msg)) => assert_eq!(msg, "store pool is closed"),
            other => panic!("expected Connection error, got: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_unsupported_scheme() {
        match StorePool::connect("mongodb://localhost/meetups", PoolConfig::default()) {
            Err(StoreError::Connection(msg)) => assert!(msg.contains("unsupported connection scheme")),
            other => panic!("expected Connection error, got: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_clones_share_slots_and_data() {
        let pool = small_pool(2);
        let clone = pool.clone();

        let conn = pool.acquire().await.unwrap();
        assert_eq!(clone.available(), 1);

        conn.collection("meetups").insert_one("k", &1u32).await.unwrap();
        drop(conn);

        let other = clone.acquire().await.unwrap();
        assert_eq!(other.collection("meetups").find_one::<u32>("k").await.unwrap(), Some(1));
    }
}
