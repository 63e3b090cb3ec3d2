//! Core types, configuration, and utilities for the resilient client.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, Environment, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_with_path, parse_level, LogFileWriter};
pub use paths::Paths;
