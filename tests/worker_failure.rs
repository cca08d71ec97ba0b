//! A `Map` that panics takes its worker down; callers must find out

use chanmap::{BasicMap, ChannelConcurrentMap, ConcurrentMap, Error, Map};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

const POISON: u32 = 13;

/// BasicMap that panics when `POISON` is written. Deliberately not `Clone`.
#[derive(Default)]
struct Fragile {
    inner: BasicMap<u32, u32>,
}

impl fmt::Display for Fragile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Map for Fragile {
    type Key = u32;
    type Value = u32;

    fn clear(&mut self) {
        self.inner.clear()
    }
    fn contains(&self, key: &u32) -> bool {
        self.inner.contains(key)
    }
    fn delete(&mut self, key: &u32) -> Option<u32> {
        self.inner.delete(key)
    }
    fn get(&self, key: &u32) -> Option<u32> {
        self.inner.get(key)
    }
    fn len(&self) -> usize {
        self.inner.len()
    }
    fn keys(&self) -> Vec<u32> {
        self.inner.keys()
    }
    fn set(&mut self, key: u32, value: u32) -> Option<u32> {
        if key == POISON {
            panic!("refusing to store key {}", key);
        }
        self.inner.set(key, value)
    }
    fn storage(&self) -> HashMap<u32, u32> {
        self.inner.storage()
    }
}

async fn within<T>(what: &str, fut: impl Future<Output = T>) -> T {
    match tokio::time::timeout(Duration::from_secs(5), fut).await {
        Ok(out) => out,
        Err(_) => panic!("{} hung after the worker died", what),
    }
}

#[tokio::test]
async fn test_typed_worker_panic_reports_worker_gone() {
    let cm = ConcurrentMap::new(Fragile::default());
    assert_eq!(cm.set(1, 1).await.unwrap(), 1);

    let pending = within("pending set", cm.set(POISON, 1)).await;
    assert!(matches!(pending, Err(Error::WorkerGone)));

    let later = within("later get", cm.get(1)).await;
    assert!(matches!(later, Err(Error::WorkerGone)));

    let storage = within("later storage", cm.underlying_storage()).await;
    assert!(matches!(storage, Err(Error::WorkerGone)));
}

#[tokio::test]
async fn test_typed_async_twin_after_panic() {
    let cm = ConcurrentMap::new(Fragile::default());
    assert!(cm.set(POISON, 1).await.is_err());

    let (tx, rx) = tokio::sync::oneshot::channel();
    cm.len_async(move |len| {
        let _ = tx.send(len);
    });
    let len = within("len_async", rx).await.unwrap();
    assert!(matches!(len, Err(Error::WorkerGone)));
}

#[tokio::test]
async fn test_uniform_worker_panic_reports_worker_gone() {
    let cm = ChannelConcurrentMap::new(Fragile::default());
    assert_eq!(cm.set(1, 1).await.unwrap(), None);

    let pending = within("pending set", cm.set(POISON, 1)).await;
    assert!(matches!(pending, Err(Error::WorkerGone)));

    // Nobody called close(), so this is not reported as Closed.
    let later = within("later get", cm.get(1)).await;
    assert!(matches!(later, Err(Error::WorkerGone)));
    let render = within("later render", cm.render()).await;
    assert!(matches!(render, Err(Error::WorkerGone)));
    assert!(cm.is_closed());
}

#[tokio::test]
async fn test_uniform_close_after_panic_is_worker_gone() {
    let cm = ChannelConcurrentMap::new(Fragile::default());
    let clone = cm.clone();
    assert!(cm.set(POISON, 1).await.is_err());

    let closed = within("close", clone.close()).await;
    let err = closed.unwrap_err();
    assert!(matches!(err, Error::WorkerGone));
    assert!(err.is_shutdown());
}

#[tokio::test]
async fn test_uniform_close_stays_closed_for_fragile_map() {
    let cm = ChannelConcurrentMap::new(Fragile::default());
    cm.set(1, 1).await.unwrap();
    cm.close().await.unwrap();

    // Rejected at the queue, so the map never sees the poisoned key.
    let later = within("set after close", cm.set(POISON, 1)).await;
    assert!(matches!(later, Err(Error::Closed)));
}
