//! Uniform-message coordinator
//!
//! All operations travel as variants of one [`Request`] enum over a single
//! shared queue (capacity 1 by default: one request can wait while the
//! previous one is served, further senders wait for room).
//!
//! Shutdown: [`ChannelConcurrentMap::close`] makes the worker stop accepting
//! requests, serve the ones already queued, and return. Anything sent after
//! that fails with [`Error::Closed`]. If the worker dies without being
//! closed (a `Map` panicked), callers get [`Error::WorkerGone`] instead.

use crate::common::{BasicMap, CoordinatorConfig, Error, Map, Result};
use crate::coordinator::respond;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace};

enum Request<K, V> {
    Clear {
        reply: oneshot::Sender<()>,
    },
    Contains {
        key: K,
        reply: oneshot::Sender<bool>,
    },
    Delete {
        key: K,
        reply: oneshot::Sender<Option<V>>,
    },
    Get {
        key: K,
        reply: oneshot::Sender<Option<V>>,
    },
    Len {
        reply: oneshot::Sender<usize>,
    },
    Keys {
        reply: oneshot::Sender<Vec<K>>,
    },
    Set {
        key: K,
        value: V,
        reply: oneshot::Sender<Option<V>>,
    },
    Render {
        reply: oneshot::Sender<String>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

/// Thread-safe handle over a [`Map`] owned by a background worker, with an
/// explicit shutdown.
pub struct ChannelConcurrentMap<M: Map> {
    requests: mpsc::Sender<Request<M::Key, M::Value>>,
    /// Set by the worker when it accepts a close, before the queue shuts.
    closing: Arc<AtomicBool>,
}

impl<M: Map> Clone for ChannelConcurrentMap<M> {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
            closing: self.closing.clone(),
        }
    }
}

impl<M> ChannelConcurrentMap<M>
where
    M: Map + fmt::Display,
{
    /// Wrap `map` and spawn its worker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(map: M) -> Self {
        Self::spawn(map, CoordinatorConfig::default().request_buffer)
    }

    /// Like [`ChannelConcurrentMap::new`] with the queue size taken from `config`.
    pub fn with_config(map: M, config: &CoordinatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::spawn(map, config.request_buffer))
    }

    fn spawn(map: M, capacity: usize) -> Self {
        let (requests, rx) = mpsc::channel(capacity);
        let closing = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            map,
            requests: rx,
            closing: closing.clone(),
        };
        tokio::spawn(worker.run());
        Self { requests, closing }
    }

    /// Why the worker no longer takes requests.
    fn stopped(&self) -> Error {
        if self.closing.load(Ordering::Acquire) {
            Error::Closed
        } else {
            Error::WorkerGone
        }
    }

    async fn call<T>(
        &self,
        request: impl FnOnce(oneshot::Sender<T>) -> Request<M::Key, M::Value>,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(request(reply))
            .await
            .map_err(|_| self.stopped())?;
        Ok(rx.await?)
    }

    pub async fn clear(&self) -> Result<()> {
        self.call(|reply| Request::Clear { reply }).await
    }

    pub async fn contains(&self, key: M::Key) -> Result<bool> {
        self.call(|reply| Request::Contains { key, reply }).await
    }

    /// Remove `key`, returning the value it held.
    pub async fn delete(&self, key: M::Key) -> Result<Option<M::Value>> {
        self.call(|reply| Request::Delete { key, reply }).await
    }

    pub async fn get(&self, key: M::Key) -> Result<Option<M::Value>> {
        self.call(|reply| Request::Get { key, reply }).await
    }

    pub async fn len(&self) -> Result<usize> {
        self.call(|reply| Request::Len { reply }).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Every key, in no particular order.
    pub async fn keys(&self) -> Result<Vec<M::Key>> {
        self.call(|reply| Request::Keys { reply }).await
    }

    /// Insert or overwrite, returning the previous value.
    pub async fn set(&self, key: M::Key, value: M::Value) -> Result<Option<M::Value>> {
        self.call(|reply| Request::Set { key, value, reply }).await
    }

    /// The map's `Display` output, formatted on the worker.
    pub async fn render(&self) -> Result<String> {
        self.call(|reply| Request::Render { reply }).await
    }

    /// Stop the worker.
    ///
    /// Requests queued before the close are still served; this resolves once
    /// they are done and the worker is returning. Closing twice, or any call
    /// after close, yields [`Error::Closed`]. Closing a coordinator whose
    /// worker died yields [`Error::WorkerGone`].
    pub async fn close(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Request::Close { reply })
            .await
            .map_err(|_| self.stopped())?;
        // A close that was queued behind another close is dropped unanswered.
        rx.await.map_err(|_| self.stopped())
    }

    /// Whether the coordinator has stopped accepting requests.
    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }
}

impl<K, V> ChannelConcurrentMap<BasicMap<K, V>>
where
    K: Eq + Hash + Clone + Send + fmt::Display + 'static,
    V: Clone + Send + fmt::Display + 'static,
{
    /// Coordinator over an empty [`BasicMap`].
    pub fn new_basic() -> Self {
        Self::new(BasicMap::new())
    }
}

struct Worker<M: Map> {
    map: M,
    requests: mpsc::Receiver<Request<M::Key, M::Value>>,
    closing: Arc<AtomicBool>,
}

impl<M> Worker<M>
where
    M: Map + fmt::Display,
{
    async fn run(mut self) {
        debug!("uniform coordinator worker started");
        let mut closer = None;

        while let Some(request) = self.requests.recv().await {
            match request {
                Request::Clear { reply } => {
                    trace!(op = "clear", "dispatch");
                    self.map.clear();
                    respond(reply, (), "clear");
                }
                Request::Contains { key, reply } => {
                    trace!(op = "contains", "dispatch");
                    respond(reply, self.map.contains(&key), "contains");
                }
                Request::Delete { key, reply } => {
                    trace!(op = "delete", "dispatch");
                    respond(reply, self.map.delete(&key), "delete");
                }
                Request::Get { key, reply } => {
                    trace!(op = "get", "dispatch");
                    respond(reply, self.map.get(&key), "get");
                }
                Request::Len { reply } => {
                    trace!(op = "len", "dispatch");
                    respond(reply, self.map.len(), "len");
                }
                Request::Keys { reply } => {
                    trace!(op = "keys", "dispatch");
                    respond(reply, self.map.keys(), "keys");
                }
                Request::Set { key, value, reply } => {
                    trace!(op = "set", "dispatch");
                    respond(reply, self.map.set(key, value), "set");
                }
                Request::Render { reply } => {
                    trace!(op = "render", "dispatch");
                    respond(reply, self.map.to_string(), "render");
                }
                Request::Close { reply } => {
                    if closer.is_none() {
                        info!("closing coordinator, draining queued requests");
                        self.closing.store(true, Ordering::Release);
                        // recv() keeps yielding what is already buffered, then None.
                        self.requests.close();
                        closer = Some(reply);
                    }
                }
            }
        }

        if let Some(reply) = closer {
            respond(reply, (), "close");
        }
        debug!("uniform coordinator worker stopped");
    }
}
