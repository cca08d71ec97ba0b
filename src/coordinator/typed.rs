//! Request-typed coordinator
//!
//! Every operation kind has its own queue. The worker waits on all of them at
//! once and serves whichever is ready; `select!` picks randomly among ready
//! branches, so no kind is favoured. Requests of one kind are served in the
//! order they were sent.
//!
//! There is no close operation. The worker stops once every handle (and every
//! in-flight `*_async` task holding one) has been dropped.

use crate::common::{BasicMap, CoordinatorConfig, Error, Map, Result};
use crate::coordinator::respond;
use std::collections::HashMap;
use std::hash::Hash;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

type Storage<M> = HashMap<<M as Map>::Key, <M as Map>::Value>;

/// Runs on the worker with the live map; used to copy it out.
type Snapshot<M> = Box<dyn FnOnce(&M) + Send>;

struct ContainsRequest<K> {
    key: K,
    reply: oneshot::Sender<bool>,
}

struct DeleteRequest<K> {
    key: K,
    reply: oneshot::Sender<usize>,
}

struct GetRequest<K, V> {
    key: K,
    reply: oneshot::Sender<Option<V>>,
}

struct SetRequest<K, V> {
    key: K,
    value: V,
    reply: oneshot::Sender<usize>,
}

/// Thread-safe handle over a [`Map`] owned by a background worker.
///
/// Cloning the handle is cheap and every clone talks to the same worker.
/// The map itself only has to be `Clone` for [`underlying_map`](Self::underlying_map).
pub struct ConcurrentMap<M: Map> {
    map_tx: mpsc::Sender<Snapshot<M>>,
    storage_tx: mpsc::Sender<oneshot::Sender<Storage<M>>>,
    clear_tx: mpsc::Sender<oneshot::Sender<()>>,
    contains_tx: mpsc::Sender<ContainsRequest<M::Key>>,
    delete_tx: mpsc::Sender<DeleteRequest<M::Key>>,
    len_tx: mpsc::Sender<oneshot::Sender<usize>>,
    get_tx: mpsc::Sender<GetRequest<M::Key, M::Value>>,
    set_tx: mpsc::Sender<SetRequest<M::Key, M::Value>>,
}

impl<M: Map> Clone for ConcurrentMap<M> {
    fn clone(&self) -> Self {
        Self {
            map_tx: self.map_tx.clone(),
            storage_tx: self.storage_tx.clone(),
            clear_tx: self.clear_tx.clone(),
            contains_tx: self.contains_tx.clone(),
            delete_tx: self.delete_tx.clone(),
            len_tx: self.len_tx.clone(),
            get_tx: self.get_tx.clone(),
            set_tx: self.set_tx.clone(),
        }
    }
}

/// Send one request and wait for its reply.
async fn call<R, T>(
    tx: &mpsc::Sender<R>,
    request: impl FnOnce(oneshot::Sender<T>) -> R,
) -> Result<T> {
    let (reply, rx) = oneshot::channel();
    // The receivers only go away if the worker panicked inside the map.
    tx.send(request(reply))
        .await
        .map_err(|_| Error::WorkerGone)?;
    Ok(rx.await?)
}

impl<M: Map> ConcurrentMap<M> {
    /// Wrap `map` and spawn its worker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(map: M) -> Self {
        Self::spawn(map, CoordinatorConfig::default().kind_buffer)
    }

    /// Like [`ConcurrentMap::new`] with queue sizes taken from `config`.
    pub fn with_config(map: M, config: &CoordinatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::spawn(map, config.kind_buffer))
    }

    fn spawn(map: M, capacity: usize) -> Self {
        let (map_tx, map_rx) = mpsc::channel(capacity);
        let (storage_tx, storage_rx) = mpsc::channel(capacity);
        let (clear_tx, clear_rx) = mpsc::channel(capacity);
        let (contains_tx, contains_rx) = mpsc::channel(capacity);
        let (delete_tx, delete_rx) = mpsc::channel(capacity);
        let (len_tx, len_rx) = mpsc::channel(capacity);
        let (get_tx, get_rx) = mpsc::channel(capacity);
        let (set_tx, set_rx) = mpsc::channel(capacity);

        let worker = Worker {
            map,
            map_rx,
            storage_rx,
            clear_rx,
            contains_rx,
            delete_rx,
            len_rx,
            get_rx,
            set_rx,
        };
        tokio::spawn(worker.run());

        Self {
            map_tx,
            storage_tx,
            clear_tx,
            contains_tx,
            delete_tx,
            len_tx,
            get_tx,
            set_tx,
        }
    }

    /// Raw snapshot of the stored entries.
    pub async fn underlying_storage(&self) -> Result<Storage<M>> {
        call(&self.storage_tx, |reply| reply).await
    }

    pub async fn clear(&self) -> Result<()> {
        call(&self.clear_tx, |reply| reply).await
    }

    pub async fn contains(&self, key: M::Key) -> Result<bool> {
        call(&self.contains_tx, |reply| ContainsRequest { key, reply }).await
    }

    /// Remove `key`; returns the length after removal.
    pub async fn delete(&self, key: M::Key) -> Result<usize> {
        call(&self.delete_tx, |reply| DeleteRequest { key, reply }).await
    }

    pub async fn get(&self, key: M::Key) -> Result<Option<M::Value>> {
        call(&self.get_tx, |reply| GetRequest { key, reply }).await
    }

    /// Two round trips through [`len`](Self::len); there is no dedicated message.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    pub async fn len(&self) -> Result<usize> {
        call(&self.len_tx, |reply| reply).await
    }

    /// Insert or overwrite; returns the length after insertion.
    pub async fn set(&self, key: M::Key, value: M::Value) -> Result<usize> {
        call(&self.set_tx, |reply| SetRequest { key, value, reply }).await
    }

    // Callback twins. Each spawns its own task: the caller returns at once and
    // callbacks from separate calls may fire in any order.

    pub fn underlying_storage_async<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Storage<M>>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { callback(this.underlying_storage().await) })
    }

    pub fn clear_async<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { callback(this.clear().await) })
    }

    pub fn contains_async<F>(&self, key: M::Key, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<bool>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { callback(this.contains(key).await) })
    }

    pub fn delete_async<F>(&self, key: M::Key, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<usize>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { callback(this.delete(key).await) })
    }

    pub fn get_async<F>(&self, key: M::Key, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Option<M::Value>>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { callback(this.get(key).await) })
    }

    pub fn is_empty_async<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<bool>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { callback(this.is_empty().await) })
    }

    pub fn len_async<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<usize>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { callback(this.len().await) })
    }

    pub fn set_async<F>(&self, key: M::Key, value: M::Value, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<usize>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { callback(this.set(key, value).await) })
    }
}

impl<M: Map + Clone> ConcurrentMap<M> {
    /// Copy of the map as the worker currently holds it.
    ///
    /// The worker keeps ownership; changes made to the copy are not seen by
    /// the coordinator.
    pub async fn underlying_map(&self) -> Result<M> {
        call(&self.map_tx, |reply| -> Snapshot<M> {
            Box::new(move |map: &M| respond(reply, map.clone(), "underlying_map"))
        })
        .await
    }

    pub fn underlying_map_async<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<M>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { callback(this.underlying_map().await) })
    }
}

impl<K, V> ConcurrentMap<BasicMap<K, V>>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Coordinator over an empty [`BasicMap`].
    pub fn new_basic() -> Self {
        Self::new(BasicMap::new())
    }
}

/// Owns the map and the receiving half of every queue.
struct Worker<M: Map> {
    map: M,
    map_rx: mpsc::Receiver<Snapshot<M>>,
    storage_rx: mpsc::Receiver<oneshot::Sender<Storage<M>>>,
    clear_rx: mpsc::Receiver<oneshot::Sender<()>>,
    contains_rx: mpsc::Receiver<ContainsRequest<M::Key>>,
    delete_rx: mpsc::Receiver<DeleteRequest<M::Key>>,
    len_rx: mpsc::Receiver<oneshot::Sender<usize>>,
    get_rx: mpsc::Receiver<GetRequest<M::Key, M::Value>>,
    set_rx: mpsc::Receiver<SetRequest<M::Key, M::Value>>,
}

impl<M: Map> Worker<M> {
    async fn run(mut self) {
        debug!("typed coordinator worker started");

        loop {
            tokio::select! {
                Some(snapshot) = self.map_rx.recv() => {
                    trace!(op = "underlying_map", "dispatch");
                    snapshot(&self.map);
                }
                Some(reply) = self.storage_rx.recv() => {
                    trace!(op = "underlying_storage", "dispatch");
                    respond(reply, self.map.storage(), "underlying_storage");
                }
                Some(reply) = self.clear_rx.recv() => {
                    trace!(op = "clear", "dispatch");
                    self.map.clear();
                    respond(reply, (), "clear");
                }
                Some(req) = self.contains_rx.recv() => {
                    trace!(op = "contains", "dispatch");
                    respond(req.reply, self.map.contains(&req.key), "contains");
                }
                Some(req) = self.delete_rx.recv() => {
                    trace!(op = "delete", "dispatch");
                    self.map.delete(&req.key);
                    respond(req.reply, self.map.len(), "delete");
                }
                Some(reply) = self.len_rx.recv() => {
                    trace!(op = "len", "dispatch");
                    respond(reply, self.map.len(), "len");
                }
                Some(req) = self.get_rx.recv() => {
                    trace!(op = "get", "dispatch");
                    respond(req.reply, self.map.get(&req.key), "get");
                }
                Some(req) = self.set_rx.recv() => {
                    trace!(op = "set", "dispatch");
                    self.map.set(req.key, req.value);
                    respond(req.reply, self.map.len(), "set");
                }
                // Every handle is gone.
                else => break,
            }
        }

        debug!("typed coordinator worker stopped");
    }
}
