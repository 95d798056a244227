//! Tracking of live connection tasks so shutdown can force-close them.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::AbortHandle;
use tracing::debug;

/// A shared set of running connection tasks.
///
/// Every task spawned through [`ConnectionRegistry::spawn`] is registered
/// until it finishes or is aborted. A single mutex guards the set; it is
/// never held across an await point.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    connections: HashMap<u64, AbortHandle>,
    closed: bool,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `future` on the runtime and tracks it until it completes.
    ///
    /// Once [`close_all`](Self::close_all) has run, `future` is dropped
    /// without being spawned and `false` is returned.
    pub fn spawn<F>(&self, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // the lock is held until the handle is stored, so a task finishing
        // immediately still deregisters after its own registration
        let mut inner = self.lock();
        if inner.closed {
            debug!("registry closed, dropping connection");
            return false;
        }
        let id = inner.next_id;
        inner.next_id += 1;

        let guard = ConnectionGuard { id, registry: self.clone() };
        let handle = tokio::spawn(async move {
            let _guard = guard;
            future.await;
        });
        inner.connections.insert(id, handle.abort_handle());
        true
    }

    /// Number of connections currently open.
    pub fn len(&self) -> usize {
        self.lock().connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aborts every tracked connection, dropping its socket, and refuses
    /// later spawns. Returns how many were aborted.
    pub fn close_all(&self) -> usize {
        let handles: Vec<AbortHandle> = {
            let mut inner = self.lock();
            inner.closed = true;
            inner.connections.drain().map(|(_, handle)| handle).collect()
        };
        for handle in &handles {
            handle.abort();
        }
        debug!(count = handles.len(), "force closed connections");
        handles.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes its connection from the registry when the task ends, including
/// when the task is aborted.
#[derive(Debug)]
struct ConnectionGuard {
    id: u64,
    registry: ConnectionRegistry,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.lock().connections.remove(&self.id);
    }
}
