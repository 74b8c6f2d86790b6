//! Persistent blob stores for tally.
//!
//! Two backends implement [`tally_core::BlobStore`]:
//!
//! - [`JsonFileStore`]: one JSON file per key (or a single file), written via
//!   a temp file and rename under an advisory lock
//! - [`SqliteStore`]: a single `kv` table in a `rusqlite` database
//!
//! # Thread Safety
//!
//! [`SqliteStore`] wraps a `rusqlite::Connection`, which is `Send` but not
//! `Sync`. Share it behind a `Mutex` or open one store per thread.
//!
//! The file store's lock is per operation. It keeps a reader from observing
//! a half-written file and serializes concurrent writers, but it does not
//! span the engine's read-modify-write cycle.

mod file;
mod sqlite;

pub use file::JsonFileStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Errors opening a store.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to prepare the store location.
    #[error("failed to prepare {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
