//! Core types, configuration, and utilities for the Wired Journal client.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_LIST_LIMIT, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
