//! Application state shared across handlers.
//!
//! Built once by the composition root in `main` and threaded into the
//! router; handlers never reach for a global.

use std::sync::Arc;

use mixbench_core::{CacheAsideReader, KeyValueCache, RecordStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: RecordStore,
    cache: KeyValueCache,
    reader: CacheAsideReader,
}

impl AppState {
    pub fn new(store: RecordStore, cache: KeyValueCache) -> Self {
        let reader = CacheAsideReader::new(store.clone(), cache.clone());
        Self {
            inner: Arc::new(AppStateInner {
                store,
                cache,
                reader,
            }),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.inner.store
    }

    pub fn cache(&self) -> &KeyValueCache {
        &self.inner.cache
    }

    pub fn reader(&self) -> &CacheAsideReader {
        &self.inner.reader
    }
}
