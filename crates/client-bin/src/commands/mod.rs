//! CLI command implementations.

mod auth;
mod queue;
mod request;
mod tokens;

pub use auth::{login, logout, status};
pub use queue::{queue_clear, queue_drain, queue_status};
pub use request::request;
pub use tokens::{tokens_clear, tokens_status};
