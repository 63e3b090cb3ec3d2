//! Single-flight token refresh.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::future::Future;
use tracing::debug;

/// Why a refresh did not produce a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RefreshFailure(pub String);

type RefreshOutcome = Result<String, RefreshFailure>;
type RefreshFuture = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Holds at most one in-flight refresh. Every caller that arrives while it
/// is pending awaits the same future and sees the same outcome.
#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    inflight: Mutex<Option<RefreshFuture>>,
}

impl RefreshCoordinator {
    /// Join the pending refresh, or start one with `start`.
    pub(crate) async fn run<F, Fut>(&self, start: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome> + Send + 'static,
    {
        let future = {
            let mut inflight = self.inflight.lock();
            match inflight.as_ref() {
                // A settled future left behind by a cancelled caller is stale
                Some(pending) if pending.peek().is_none() => {
                    debug!("Joining in-flight token refresh");
                    pending.clone()
                }
                _ => {
                    let fresh = start().boxed().shared();
                    *inflight = Some(fresh.clone());
                    fresh
                }
            }
        };

        let outcome = future.clone().await;

        let mut inflight = self.inflight.lock();
        if inflight
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&future))
        {
            *inflight = None;
        }

        outcome
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.inflight
            .lock()
            .as_ref()
            .is_some_and(|f| f.peek().is_none())
    }
}
