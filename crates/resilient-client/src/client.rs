//! The request engine.

use crate::refresh::{RefreshCoordinator, RefreshFailure};
use crate::{
    ApiResponse, ClientConfig, ClientError, ClientResult, ConnectivityMonitor, HttpMethod,
    HttpTransport, NetworkState, OfflineQueue, OfflineQueueItem, TransportError,
    TransportErrorKind, TransportRequest, TransportResponse,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use token_store::{TokenPair, TokenStore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use vault_storage::Vault;

const AUTHORIZATION: &str = "Authorization";
const REFRESH_PATH: &str = "/auth/refresh";

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Do not attach a bearer token.
    pub skip_auth: bool,
    /// Do not refresh on 401.
    pub skip_refresh: bool,
    /// Never persist to the offline queue; attempt the request regardless.
    pub skip_queue: bool,
    /// Overrides the configured per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Merged over the default headers.
    pub headers: BTreeMap<String, String>,
}

impl RequestOptions {
    /// Options for unauthenticated endpoints (login, register, refresh).
    pub fn unauthenticated() -> Self {
        Self {
            skip_auth: true,
            skip_refresh: true,
            ..Self::default()
        }
    }

    pub fn without_refresh() -> Self {
        Self {
            skip_refresh: true,
            ..Self::default()
        }
    }

    /// Keep the request out of the offline queue.
    pub fn without_queue(mut self) -> Self {
        self.skip_queue = true;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Outcome of one offline-queue drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub succeeded: usize,
    /// Failed and put back with an incremented retry count.
    pub requeued: usize,
    /// Failed for the last time.
    pub dropped: usize,
    /// Not attempted because connectivity dropped mid-pass.
    pub deferred: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshPayload {
    access_token: String,
    expires_at: i64,
}

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenStore>,
    token_cache: RwLock<Option<String>>,
    network: ConnectivityMonitor,
    queue: OfflineQueue,
    refresh: RefreshCoordinator,
    drain_lock: tokio::sync::Mutex<()>,
}

/// Resilient API client. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    /// Build a client, reloading any offline queue persisted in `vault`.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        vault: Arc<Vault>,
        tokens: Arc<TokenStore>,
        network: ConnectivityMonitor,
    ) -> ClientResult<Self> {
        let queue = OfflineQueue::load(vault)?;
        info!(
            base_url = %config.base_url,
            queued = queue.len(),
            "API client initialized"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                tokens,
                token_cache: RwLock::new(None),
                network,
                queue,
                refresh: RefreshCoordinator::default(),
                drain_lock: tokio::sync::Mutex::new(()),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn token_store(&self) -> &Arc<TokenStore> {
        &self.inner.tokens
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.inner.network
    }

    pub fn network_state(&self) -> NetworkState {
        self.inner.network.current()
    }

    pub fn offline_queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    pub fn offline_queue(&self) -> Vec<OfflineQueueItem> {
        self.inner.queue.snapshot()
    }

    pub fn clear_offline_queue(&self) -> ClientResult<()> {
        Ok(self.inner.queue.clear()?)
    }

    /// Persist a new session and make its access token current.
    pub fn store_session(&self, tokens: &TokenPair) -> ClientResult<()> {
        self.inner.tokens.store_tokens(tokens)?;
        *self.inner.token_cache.write() = Some(tokens.access_token.clone());
        Ok(())
    }

    /// Forget the session, durably and in memory.
    pub fn clear_session(&self) -> ClientResult<()> {
        *self.inner.token_cache.write() = None;
        self.inner.tokens.clear_tokens()?;
        Ok(())
    }

    /// Refresh the access token, joining any refresh already in flight.
    /// Failure clears the session.
    pub async fn refresh_access_token(&self) -> ClientResult<String> {
        self.inner
            .coordinated_refresh()
            .await
            .map_err(|RefreshFailure(reason)| ClientError::AuthenticationFailed(reason))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse<T>> {
        self.request(HttpMethod::Get, path, None, options).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse<T>> {
        self.request(HttpMethod::Post, path, body, options).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse<T>> {
        self.request(HttpMethod::Put, path, body, options).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse<T>> {
        self.request(HttpMethod::Patch, path, body, options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse<T>> {
        self.request(HttpMethod::Delete, path, None, options).await
    }

    /// Issue a request.
    ///
    /// While offline (with queueing enabled) the request is persisted and
    /// `Queued` is returned immediately.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse<T>> {
        let inner = &self.inner;

        let mut headers = inner.base_headers(&options.headers);
        if !options.skip_auth {
            if let Some(token) = inner.access_token()? {
                set_header(&mut headers, AUTHORIZATION, bearer(&token));
            }
        }

        let queueable = inner.config.enable_offline_queue && !options.skip_queue;
        if !inner.network.is_connected() && queueable {
            inner.enqueue(path, method, body, headers)?;
            return Err(ClientError::Queued);
        }

        let timeout = options.timeout.unwrap_or(inner.config.timeout);
        let result = inner
            .dispatch(method, path, body.clone(), headers.clone(), &options, timeout)
            .await;

        match result {
            Ok(value) => Ok(ApiResponse::from_body(value)?),
            Err(err) => {
                if queueable && err.is_offline_recoverable() && !inner.network.is_connected() {
                    warn!(method = %method, path = %path, error = %err, "Request failed while offline, queueing");
                    if let Err(queue_err) = inner.enqueue(path, method, body, headers) {
                        error!(error = %queue_err, "Failed to queue request");
                    }
                }
                Err(err)
            }
        }
    }

    /// Replay every queued request in order.
    ///
    /// Items that fail are put back with `retry_count + 1` until they reach
    /// `max_retries`. Items not yet attempted when connectivity drops are put
    /// back untouched.
    pub async fn drain_offline_queue(&self) -> ClientResult<DrainReport> {
        let inner = &self.inner;
        let _drain = inner.drain_lock.lock().await;

        let mut report = DrainReport::default();
        if !inner.network.is_connected() {
            return Ok(report);
        }

        let items = inner.queue.take_all();
        if items.is_empty() {
            return Ok(report);
        }
        info!(count = items.len(), "Draining offline queue");

        let mut returned = Vec::new();
        let mut pending = items.into_iter();
        while let Some(mut item) = pending.next() {
            if !inner.network.is_connected() {
                returned.push(item);
                returned.extend(pending.by_ref());
                report.deferred = returned.len();
                warn!(deferred = report.deferred, "Connectivity lost during drain");
                break;
            }

            match inner.replay(&item).await {
                Ok(()) => {
                    debug!(id = %item.id, "Replayed queued request");
                    report.succeeded += 1;
                }
                Err(e) => {
                    item.retry_count += 1;
                    if item.retry_count < item.max_retries {
                        warn!(id = %item.id, retry_count = item.retry_count, error = %e, "Queued request failed, keeping");
                        returned.push(item);
                        report.requeued += 1;
                    } else {
                        warn!(id = %item.id, retry_count = item.retry_count, error = %e, "Queued request failed, dropping");
                        report.dropped += 1;
                    }
                }
            }
        }

        inner.queue.restore(returned)?;
        info!(
            succeeded = report.succeeded,
            requeued = report.requeued,
            dropped = report.dropped,
            deferred = report.deferred,
            "Offline queue drain finished"
        );
        Ok(report)
    }

    /// Drain the queue whenever connectivity comes back.
    ///
    /// The task holds only a weak reference and exits once every client
    /// handle is dropped and the monitor stops publishing.
    pub fn spawn_reconnect_listener(&self) -> JoinHandle<()> {
        let weak: Weak<ClientInner> = Arc::downgrade(&self.inner);
        let mut updates = self.inner.network.subscribe();
        let mut was_connected = updates.borrow_and_update().is_connected;

        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let connected = updates.borrow_and_update().is_connected;
                let Some(inner) = weak.upgrade() else {
                    break;
                };

                if connected && (!was_connected || !inner.queue.is_empty()) {
                    let client = ApiClient { inner };
                    if let Err(e) = client.drain_offline_queue().await {
                        error!(error = %e, "Offline queue drain failed");
                    }
                }
                was_connected = connected;
            }
            debug!("Reconnect listener stopped");
        })
    }
}

impl ClientInner {
    fn base_headers(&self, overrides: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ]);
        for (name, value) in self.config.default_headers.iter().chain(overrides) {
            set_header(&mut headers, name, value.clone());
        }
        headers
    }

    fn access_token(&self) -> ClientResult<Option<String>> {
        if let Some(token) = self.token_cache.read().clone() {
            return Ok(Some(token));
        }
        let token = self.tokens.get_access_token()?;
        if let Some(token) = &token {
            *self.token_cache.write() = Some(token.clone());
        }
        Ok(token)
    }

    fn enqueue(
        &self,
        path: &str,
        method: HttpMethod,
        body: Option<Value>,
        headers: BTreeMap<String, String>,
    ) -> ClientResult<()> {
        let item = OfflineQueueItem::new(path, method, body, headers, self.config.max_retries);
        self.queue.enqueue(item)?;
        Ok(())
    }

    /// Execute, handle 401 by refreshing once, and decode the outcome.
    async fn dispatch(
        self: &Arc<Self>,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        headers: BTreeMap<String, String>,
        options: &RequestOptions,
        timeout: Duration,
    ) -> ClientResult<Value> {
        let mut request = TransportRequest {
            method,
            url: self.config.resolve_url(path),
            headers,
            body,
        };

        let response = self.execute(&request, timeout).await?;

        if response.status == 401 && !options.skip_auth && !options.skip_refresh {
            debug!(method = %method, path = %path, "Got 401, refreshing token");
            let token = self
                .coordinated_refresh()
                .await
                .map_err(|RefreshFailure(reason)| ClientError::AuthenticationFailed(reason))?;

            set_header(&mut request.headers, AUTHORIZATION, bearer(&token));
            let retried = self.execute(&request, timeout).await?;
            return handle_response(retried);
        }

        handle_response(response)
    }

    /// Send with timeout and bounded retry of transient transport failures.
    async fn execute(
        &self,
        request: &TransportRequest,
        timeout: Duration,
    ) -> ClientResult<TransportResponse> {
        let mut attempt: u32 = 0;

        loop {
            let failure = match tokio::time::timeout(timeout, self.transport.send(request)).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => e,
                Err(_) => TransportError::new(
                    TransportErrorKind::Timeout,
                    format!("no response within {}ms", timeout.as_millis()),
                ),
            };

            let can_retry = failure.is_retryable() && self.network.is_connected();
            if !can_retry || attempt >= self.config.max_retries {
                warn!(
                    method = %request.method,
                    url = %request.url,
                    attempts = attempt + 1,
                    error = %failure,
                    "Request failed"
                );
                return Err(match failure.kind {
                    TransportErrorKind::Timeout => ClientError::Timeout,
                    _ => ClientError::Network {
                        attempts: attempt + 1,
                        message: failure.message,
                    },
                });
            }

            let delay = self.config.delay_for_attempt(attempt);
            debug!(
                method = %request.method,
                url = %request.url,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn coordinated_refresh(self: &Arc<Self>) -> Result<String, RefreshFailure> {
        let inner = Arc::clone(self);
        self.refresh
            .run(move || async move { inner.perform_refresh().await })
            .await
    }

    async fn perform_refresh(&self) -> Result<String, RefreshFailure> {
        match self.try_refresh().await {
            Ok(token) => {
                *self.token_cache.write() = Some(token.clone());
                info!("Access token refreshed");
                Ok(token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                *self.token_cache.write() = None;
                if let Err(clear_err) = self.tokens.clear_tokens() {
                    error!(error = %clear_err, "Failed to clear tokens after refresh failure");
                }
                Err(RefreshFailure(e.to_string()))
            }
        }
    }

    async fn try_refresh(&self) -> ClientResult<String> {
        let refresh_token = self
            .tokens
            .get_refresh_token()?
            .ok_or_else(|| ClientError::AuthenticationFailed("no refresh token".to_string()))?;

        let request = TransportRequest {
            method: HttpMethod::Post,
            url: self.config.resolve_url(REFRESH_PATH),
            headers: self.base_headers(&BTreeMap::new()),
            body: Some(json!({ "refreshToken": refresh_token })),
        };

        let response = self.execute(&request, self.config.timeout).await?;
        let body = handle_response(response)?;
        let payload: RefreshPayload = match body.get("data") {
            Some(data) => serde_json::from_value(data.clone())?,
            None => serde_json::from_value(body)?,
        };

        self.tokens
            .update_access_token(&payload.access_token, payload.expires_at)?;
        Ok(payload.access_token)
    }

    /// Replay a queued item through the normal execution path.
    async fn replay(self: &Arc<Self>, item: &OfflineQueueItem) -> ClientResult<()> {
        let mut headers = item.headers.clone();
        let had_auth = headers.keys().any(|k| k.eq_ignore_ascii_case(AUTHORIZATION));
        headers.retain(|k, _| !k.eq_ignore_ascii_case(AUTHORIZATION));

        if had_auth {
            if let Some(token) = self.access_token()? {
                set_header(&mut headers, AUTHORIZATION, bearer(&token));
            }
        }

        let options = RequestOptions {
            skip_auth: !had_auth,
            ..RequestOptions::default()
        };

        self.dispatch(
            item.method,
            &item.url,
            item.body.clone(),
            headers,
            &options,
            self.config.timeout,
        )
        .await
        .map(|_| ())
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Insert a header, replacing any existing entry whose name differs only in case.
fn set_header(headers: &mut BTreeMap<String, String>, name: &str, value: String) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}

/// 2xx bodies are returned; anything else becomes `ClientError::Http`.
fn handle_response(response: TransportResponse) -> ClientResult<Value> {
    let body = match response.body_value() {
        Ok(body) => body,
        Err(e) if response.is_success() => return Err(ClientError::Decode(e)),
        Err(_) => Value::String(String::from_utf8_lossy(&response.body).into_owned()),
    };

    if response.is_success() {
        Ok(body)
    } else {
        Err(ClientError::http(response.status, body))
    }
}
