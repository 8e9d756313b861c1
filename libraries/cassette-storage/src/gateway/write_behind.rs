//! Write-behind gateway
//!
//! Hands writes to a background tokio task so callers on the command path
//! never wait for disk. Reads see pending writes immediately. A write the
//! backing store rejects stays pending and is tried again after the next
//! successful write and on every `flush`.

use crate::error::StorageError;
use cassette_core::{PersistenceGateway, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

enum WriteOp {
    Set { key: String, value: Vec<u8>, seq: u64 },
    Remove { key: String, seq: u64 },
    Flush(oneshot::Sender<()>),
}

/// Latest value per key that the backing store has not confirmed yet
#[derive(Default)]
struct Pending {
    next_seq: u64,
    entries: HashMap<String, (u64, Option<Vec<u8>>)>,
    /// Keys whose last write attempt failed
    failed: HashSet<String>,
}

pub struct WriteBehindGateway {
    inner: Arc<dyn PersistenceGateway>,
    pending: Arc<Mutex<Pending>>,
    tx: mpsc::UnboundedSender<WriteOp>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl WriteBehindGateway {
    /// Start the writer task on the current tokio runtime
    pub fn spawn(inner: Arc<dyn PersistenceGateway>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(Mutex::new(Pending::default()));
        let task = tokio::spawn(run_writer(inner.clone(), pending.clone(), rx));

        Self {
            inner,
            pending,
            tx,
            task: Mutex::new(Some(task)),
        }
    }

    /// Wait until every write queued so far has been attempted
    ///
    /// Failed writes are retried first; whatever still fails stays pending
    /// (see `failed_keys`).
    pub async fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(WriteOp::Flush(ack_tx))
            .map_err(|_| StorageError::WriterClosed)?;
        ack_rx.await.map_err(|_| StorageError::WriterClosed)?;
        Ok(())
    }

    /// Flush and stop the writer task
    pub async fn shutdown(&self) -> Result<()> {
        self.flush().await?;
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
            let _ = task.await;
        }
        Ok(())
    }

    /// Number of keys whose latest write has not reached the backing store
    pub fn pending_len(&self) -> usize {
        lock(&self.pending).entries.len()
    }

    /// Keys the backing store rejected, in sorted order
    pub fn failed_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.pending).failed.iter().cloned().collect();
        keys.sort();
        keys
    }

    fn enqueue(&self, key: &str, value: Option<Vec<u8>>) -> Result<()> {
        let seq = {
            let mut pending = lock(&self.pending);
            pending.next_seq += 1;
            let seq = pending.next_seq;
            pending.entries.insert(key.to_string(), (seq, value.clone()));
            seq
        };

        let key = key.to_string();
        let op = match value {
            Some(value) => WriteOp::Set { key, value, seq },
            None => WriteOp::Remove { key, seq },
        };
        self.tx.send(op).map_err(|_| StorageError::WriterClosed)?;
        Ok(())
    }
}

impl PersistenceGateway for WriteBehindGateway {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some((_, value)) = lock(&self.pending).entries.get(key) {
            return Ok(value.clone());
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.enqueue(key, Some(value.to_vec()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.enqueue(key, None)
    }
}

fn lock(pending: &Mutex<Pending>) -> std::sync::MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_writer(
    inner: Arc<dyn PersistenceGateway>,
    pending: Arc<Mutex<Pending>>,
    mut rx: mpsc::UnboundedReceiver<WriteOp>,
) {
    while let Some(op) = rx.recv().await {
        let (key, seq, value) = match op {
            WriteOp::Set { key, value, seq } => (key, seq, Some(value)),
            WriteOp::Remove { key, seq } => (key, seq, None),
            WriteOp::Flush(ack) => {
                retry_failed(&inner, &pending).await;
                let _ = ack.send(());
                continue;
            }
        };

        // The store is reachable again; push out what it missed
        if write(&inner, &pending, key, seq, value).await {
            retry_failed(&inner, &pending).await;
        }
    }
    debug!("write-behind writer stopped");
}

/// Write one value; returns whether the backing store accepted it
async fn write(
    inner: &Arc<dyn PersistenceGateway>,
    pending: &Mutex<Pending>,
    key: String,
    seq: u64,
    value: Option<Vec<u8>>,
) -> bool {
    let gateway = inner.clone();
    let write_key = key.clone();
    let result = tokio::task::spawn_blocking(move || match value {
        Some(bytes) => gateway.set(&write_key, &bytes),
        None => gateway.remove(&write_key),
    })
    .await;

    let written = match result {
        Ok(Ok(())) => {
            debug!(%key, "write-behind flushed");
            true
        }
        Ok(Err(e)) => {
            warn!(%key, error = %e, "write-behind failed, keeping value pending");
            false
        }
        Err(e) => {
            warn!(%key, error = %e, "write-behind task panicked");
            false
        }
    };

    let mut guard = lock(pending);
    // A newer write for the key may have been queued meanwhile
    let latest = guard.entries.get(&key).is_some_and(|(newest, _)| *newest == seq);
    if written {
        guard.failed.remove(&key);
        if latest {
            guard.entries.remove(&key);
        }
    } else if latest {
        guard.failed.insert(key);
    }
    written
}

async fn retry_failed(inner: &Arc<dyn PersistenceGateway>, pending: &Mutex<Pending>) {
    let retries: Vec<(String, u64, Option<Vec<u8>>)> = {
        let mut guard = lock(pending);
        let Pending {
            entries, failed, ..
        } = &mut *guard;
        failed.retain(|key| entries.contains_key(key));
        failed
            .iter()
            .filter_map(|key| {
                let (seq, value) = entries.get(key)?;
                Some((key.clone(), *seq, value.clone()))
            })
            .collect()
    };

    for (key, seq, value) in retries {
        if !write(inner, pending, key, seq, value).await {
            // Still down; the next write or flush tries again
            break;
        }
    }
}
