//! # chanmap
//!
//! Concurrency-safe key/value maps without locks:
//! - Any single-threaded [`Map`] becomes shareable across tasks
//! - One worker task owns the map; callers talk to it over channels
//! - Two dispatch strategies: per-kind typed queues, or one tagged queue
//! - Callback-style async twins and an explicit shutdown protocol
//!
//! ## Architecture
//!
//! ```text
//!  caller ─┐  request + oneshot reply
//!  caller ─┼──────────────────────────►┌──────────────┐
//!  caller ─┘                           │    worker    │── owns ──► Map
//!         ◄────────────────────────────└──────────────┘
//!                 reply (exactly once)
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use chanmap::{BasicMap, ChannelConcurrentMap, ConcurrentMap};
//!
//! # async fn demo() -> chanmap::Result<()> {
//! let typed = ConcurrentMap::new(BasicMap::new());
//! assert_eq!(typed.set("a", 1).await?, 1);
//! typed.get_async("a", |value| println!("a = {:?}", value));
//!
//! let uniform = ChannelConcurrentMap::new(BasicMap::new());
//! assert_eq!(uniform.set("a", 1).await?, None);
//! println!("{}", uniform.render().await?);
//! uniform.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod coordinator;

// Re-export commonly used types
pub use common::{BasicMap, Config, CoordinatorConfig, Error, Map, Result};
pub use coordinator::{ChannelConcurrentMap, ConcurrentMap};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
