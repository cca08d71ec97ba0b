//! Common utilities and types shared across chanmap

pub mod config;
pub mod error;
pub mod logging;
pub mod storage;

pub use self::config::{Config, CoordinatorConfig};
pub use error::{Error, Result};
pub use logging::init_tracing;
pub use storage::{BasicMap, Map};
