// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Storage layer for the meetups document store.
//
// A `StorageBackend` holds ordered byte keys. `Collection` turns it into
// named collections of JSON documents. Two backends ship here: process
// memory, and a redb file behind the `redb-backend` feature.

pub mod backend;
pub mod collection;
pub mod error;
pub mod memory;

#[cfg(feature = "redb-backend")]
pub mod redb_backend;

pub use backend::StorageBackend;
pub use collection::Collection;
pub use error::StorageError;
pub use memory::InMemoryBackend;

#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbBackend;
