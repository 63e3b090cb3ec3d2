//! Access/refresh token persistence with freshness queries.
//!
//! Tokens live in the credential vault: the full pair under `auth_tokens`,
//! plus standalone copies of the access token (ungated, for fast reads) and
//! the refresh token (presence-gated).

mod clock;
mod error;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{TokenError, TokenResult};
pub use store::{TokenPair, TokenStore, TOKEN_EXPIRY_BUFFER_MS};
