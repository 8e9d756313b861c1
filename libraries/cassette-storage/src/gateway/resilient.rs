//! Resilient gateway
//!
//! Fronts another gateway with an in-memory cache. Writes always succeed
//! from the caller's point of view: when the backing store fails, the value
//! is kept in memory, the key is marked dirty, and it is written again on
//! the next successful write or an explicit `retry_dirty`.

use crate::gateway::{FileGateway, InMemoryGateway};
use cassette_core::{PersistenceGateway, Result};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct CacheState {
    /// `None` marks a removal not yet confirmed by the backing store
    values: HashMap<String, Option<Vec<u8>>>,
    dirty: HashSet<String>,
}

pub struct ResilientGateway<G> {
    inner: G,
    state: Mutex<CacheState>,
}

impl<G: PersistenceGateway> ResilientGateway<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Write every dirty key again; returns how many are still dirty
    pub fn retry_dirty(&self) -> usize {
        let mut state = self.lock();
        let keys: Vec<String> = state.dirty.iter().cloned().collect();

        for key in keys {
            let value = state.values.get(&key).cloned().flatten();
            let written = match &value {
                Some(bytes) => self.inner.set(&key, bytes),
                None => self.inner.remove(&key),
            };
            match written {
                Ok(()) => {
                    debug!(%key, "dirty key flushed");
                    state.dirty.remove(&key);
                }
                Err(e) => {
                    debug!(%key, error = %e, "dirty key still failing");
                }
            }
        }
        state.dirty.len()
    }

    /// Whether some writes only exist in memory
    pub fn is_degraded(&self) -> bool {
        !self.lock().dirty.is_empty()
    }

    pub fn dirty_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().dirty.iter().cloned().collect();
        keys.sort();
        keys
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, key: &str, value: Option<Vec<u8>>, result: Result<()>) {
        let has_dirty = {
            let mut state = self.lock();
            state.values.insert(key.to_string(), value);
            match result {
                Ok(()) => {
                    state.dirty.remove(key);
                }
                Err(e) => {
                    warn!(%key, error = %e, "write failed, keeping value in memory");
                    state.dirty.insert(key.to_string());
                    return;
                }
            }
            !state.dirty.is_empty()
        };

        // The store is reachable again; push out what it missed
        if has_dirty {
            self.retry_dirty();
        }
    }
}

impl ResilientGateway<Arc<dyn PersistenceGateway>> {
    /// File-backed gateway, or an in-memory one when the directory is unusable
    pub fn file_or_memory(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let inner: Arc<dyn PersistenceGateway> = match FileGateway::open(&dir) {
            Ok(gateway) => Arc::new(gateway),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "storage unavailable, falling back to memory");
                Arc::new(InMemoryGateway::new())
            }
        };
        Self::new(inner)
    }
}

impl<G: PersistenceGateway> PersistenceGateway for ResilientGateway<G> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(cached) = self.lock().values.get(key) {
            return Ok(cached.clone());
        }

        match self.inner.get(key) {
            Ok(value) => {
                if let Some(bytes) = &value {
                    self.lock()
                        .values
                        .insert(key.to_string(), Some(bytes.clone()));
                }
                Ok(value)
            }
            Err(e) => {
                warn!(%key, error = %e, "read failed, treating as empty");
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let result = self.inner.set(key, value);
        self.record(key, Some(value.to_vec()), result);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let result = self.inner.remove(key);
        self.record(key, None, result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassette_core::CassetteError;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Gateway that can be switched into a failing state
    #[derive(Default)]
    struct Flaky {
        down: AtomicBool,
        store: InMemoryGateway,
    }

    impl Flaky {
        fn check(&self) -> Result<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(CassetteError::persistence("disk unavailable"));
            }
            Ok(())
        }
    }

    impl PersistenceGateway for Flaky {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            self.check()?;
            self.store.get(key)
        }
        fn set(&self, key: &str, value: &[u8]) -> Result<()> {
            self.check()?;
            self.store.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<()> {
            self.check()?;
            self.store.remove(key)
        }
    }

    #[test]
    fn failed_write_is_served_from_memory_and_retried() {
        let gateway = ResilientGateway::new(Flaky::default());
        gateway.inner().down.store(true, Ordering::SeqCst);

        gateway.set("k", b"v1").unwrap();
        assert!(gateway.is_degraded());
        assert_eq!(gateway.get("k").unwrap(), Some(b"v1".to_vec()));

        gateway.inner().down.store(false, Ordering::SeqCst);
        assert_eq!(gateway.retry_dirty(), 0);
        assert_eq!(gateway.inner().store.get("k").unwrap(), Some(b"v1".to_vec()));
    }

    #[test]
    fn next_successful_write_flushes_dirty_keys() {
        let gateway = ResilientGateway::new(Flaky::default());
        gateway.inner().down.store(true, Ordering::SeqCst);
        gateway.set("a", b"1").unwrap();

        gateway.inner().down.store(false, Ordering::SeqCst);
        gateway.set("b", b"2").unwrap();

        assert!(!gateway.is_degraded());
        assert_eq!(gateway.inner().store.get("a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn failed_read_degrades_to_empty() {
        let gateway = ResilientGateway::new(Flaky::default());
        gateway.inner().down.store(true, Ordering::SeqCst);
        assert_eq!(gateway.get("missing").unwrap(), None);
    }

    #[test]
    fn removal_is_cached_as_tombstone() {
        let gateway = ResilientGateway::new(Flaky::default());
        gateway.set("k", b"v").unwrap();

        gateway.inner().down.store(true, Ordering::SeqCst);
        gateway.remove("k").unwrap();
        assert_eq!(gateway.get("k").unwrap(), None);
        assert_eq!(gateway.dirty_keys(), vec!["k".to_string()]);
    }
}
