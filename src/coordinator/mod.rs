//! Coordinators serializing map access through a single worker task
//!
//! A coordinator moves a [`Map`](crate::common::Map) into one spawned task and
//! talks to it over channels. Callers send a request carrying a fresh
//! single-use reply channel and await the answer. Only the worker ever touches
//! the map, so no two operations interleave and no lock is needed.
//!
//! Two dispatch strategies:
//! - [`ConcurrentMap`]: one queue per operation kind, drained with `select!`.
//!   Also offers callback-style `*_async` twins and raw-storage escape hatches.
//! - [`ChannelConcurrentMap`]: one shared queue of tagged requests matched
//!   exhaustively, plus `keys`, `render` and an explicit `close`.

pub mod typed;
pub mod uniform;

pub use typed::ConcurrentMap;
pub use uniform::ChannelConcurrentMap;

use tokio::sync::oneshot;

/// Hand a result back to the caller. The caller may have given up (its
/// future was dropped), in which case the answer is discarded.
pub(crate) fn respond<T>(reply: oneshot::Sender<T>, value: T, op: &'static str) {
    if reply.send(value).is_err() {
        tracing::warn!(op, "caller went away before the reply was delivered");
    }
}
