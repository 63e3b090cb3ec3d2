//! Resilient HTTP request engine.
//!
//! The [`ApiClient`] attaches bearer tokens, retries transient transport
//! failures with exponential backoff, coordinates a single token refresh for
//! any number of concurrent 401s, and persists requests made while offline
//! so they can be replayed once connectivity returns.

mod client;
mod config;
mod error;
mod network;
mod queue;
mod refresh;
mod response;
mod transport;

pub use client::{ApiClient, DrainReport, RequestOptions};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use network::{ConnectivityMonitor, NetworkState};
pub use queue::{OfflineQueue, OfflineQueueItem};
pub use response::{ApiError, ApiMeta, ApiResponse};
pub use transport::{
    HttpMethod, HttpTransport, ReqwestTransport, TransportError, TransportErrorKind,
    TransportRequest, TransportResponse,
};

#[cfg(test)]
mod tests;
