//! Persistence adapters.
//!
//! The engine persists three independent text blobs (profile, accounts,
//! transactions) through a [`BlobStore`]. In-memory state is the source of
//! truth for a running session; the store is flushed after each mutation.

use std::future::Future;

use crate::ResultEngine;

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Names of the persisted blobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlobKey {
    Profile,
    Accounts,
    Transactions,
}

impl BlobKey {
    pub const ALL: [BlobKey; 3] = [Self::Profile, Self::Accounts, Self::Transactions];

    /// Storage name, shared with data written by earlier versions.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "expense_profile",
            Self::Accounts => "expense_accounts",
            Self::Transactions => "expense_transactions",
        }
    }
}

impl core::fmt::Display for BlobKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asynchronous key-value store for the engine blobs.
pub trait BlobStore: Send + Sync {
    /// Reads a blob, `None` when it was never written.
    fn get(&self, key: BlobKey) -> impl Future<Output = ResultEngine<Option<String>>> + Send;

    /// Writes (or overwrites) a blob.
    fn set(&self, key: BlobKey, value: String) -> impl Future<Output = ResultEngine<()>> + Send;

    /// Writes several blobs. Stores able to do so write them atomically.
    fn set_many(
        &self,
        entries: Vec<(BlobKey, String)>,
    ) -> impl Future<Output = ResultEngine<()>> + Send {
        async move {
            for (key, value) in entries {
                self.set(key, value).await?;
            }
            Ok(())
        }
    }

    /// Removes every blob.
    fn clear(&self) -> impl Future<Output = ResultEngine<()>> + Send;
}
