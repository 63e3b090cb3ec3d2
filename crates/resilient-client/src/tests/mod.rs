//! Request engine behaviour tests.
//!
//! - `harness.rs`  - scripted transport and client fixture
//! - `requests.rs` - headers, envelopes, HTTP failures, timeouts
//! - `retry.rs`    - transient failure retry and backoff
//! - `refresh.rs`  - 401 handling and single-flight refresh
//! - `offline.rs`  - offline queueing, persistence and reconnect draining
