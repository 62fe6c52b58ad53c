use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{EngineError, ResultEngine};

use super::{BlobKey, BlobStore};

/// Process-local store. Clones share the same blobs.
///
/// Writes can be made to fail on demand, to exercise the engine's
/// "log and keep the in-memory state" policy.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blobs: Arc<Mutex<HashMap<BlobKey, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with raw blobs.
    pub fn with_blobs<I>(blobs: I) -> Self
    where
        I: IntoIterator<Item = (BlobKey, String)>,
    {
        Self {
            blobs: Arc::new(Mutex::new(blobs.into_iter().collect())),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes every following write (and clear) fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Synchronous read of a blob.
    pub fn raw(&self, key: BlobKey) -> Option<String> {
        self.lock().ok().and_then(|blobs| blobs.get(&key).cloned())
    }

    fn lock(&self) -> ResultEngine<MutexGuard<'_, HashMap<BlobKey, String>>> {
        self.blobs
            .lock()
            .map_err(|_| EngineError::Store("memory store poisoned".to_string()))
    }

    fn check_writable(&self) -> ResultEngine<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(EngineError::Store("write rejected".to_string()));
        }
        Ok(())
    }
}

impl BlobStore for MemoryStore {
    async fn get(&self, key: BlobKey) -> ResultEngine<Option<String>> {
        Ok(self.lock()?.get(&key).cloned())
    }

    async fn set(&self, key: BlobKey, value: String) -> ResultEngine<()> {
        self.check_writable()?;
        self.lock()?.insert(key, value);
        Ok(())
    }

    async fn set_many(&self, entries: Vec<(BlobKey, String)>) -> ResultEngine<()> {
        self.check_writable()?;
        let mut blobs = self.lock()?;
        for (key, value) in entries {
            blobs.insert(key, value);
        }
        Ok(())
    }

    async fn clear(&self) -> ResultEngine<()> {
        self.check_writable()?;
        self.lock()?.clear();
        Ok(())
    }
}
