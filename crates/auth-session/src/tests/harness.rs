//! Test harness for auth session tests.

use crate::{AuthService, SessionStateChanged};
use async_trait::async_trait;
use biometric_guard::{BiometricGuard, BiometricType, SimulatedAuthenticator};
use resilient_client::{
    ApiClient, ClientConfig, ConnectivityMonitor, HttpMethod, HttpTransport, TransportError,
    TransportRequest, TransportResponse,
};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use token_store::{ManualClock, TokenPair, TokenStore};
use vault_storage::{MemoryStorage, Vault};

pub const BASE_URL: &str = "https://api.test/v1";
pub const NOW: i64 = 1_700_000_000_000;

type RouteKey = (HttpMethod, String);

/// Transport answering `(status, json)` per route, recording every request.
///
/// One-shot replies are used before the route's fixed reply. Unknown
/// routes get 404.
#[derive(Default)]
pub struct MockTransport {
    once: Mutex<HashMap<RouteKey, VecDeque<(u16, Value)>>>,
    fixed: Mutex<HashMap<RouteKey, (u16, Value)>>,
    log: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn once(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        self.once
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back((status, body));
    }

    pub fn always(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        self.fixed
            .lock()
            .unwrap()
            .insert((method, path.to_string()), (status, body));
    }

    pub fn requests_to(&self, method: HttpMethod, path: &str) -> Vec<TransportRequest> {
        let url = format!("{}{}", BASE_URL, path);
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .cloned()
            .collect()
    }

    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    pub fn total(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        self.log.lock().unwrap().push(request.clone());
        let path = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .to_string();
        let key = (request.method, path);

        let once = self
            .once
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        let (status, body) = once
            .or_else(|| self.fixed.lock().unwrap().get(&key).cloned())
            .unwrap_or((404, json!({ "message": "not found" })));
        Ok(TransportResponse::json(status, &body))
    }
}

pub fn user_json(id: &str, email: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "firstName": "Ada",
        "lastName": "Lovelace",
        "role": { "id": "r1", "name": "editor", "description": "Editors" },
        "permissions": [
            { "id": "p1", "name": "edit posts", "resource": "posts", "action": "update" }
        ],
        "isEmailVerified": true,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z"
    })
}

pub fn session_json(id: &str, email: &str, access_token: &str) -> Value {
    json!({
        "data": {
            "user": user_json(id, email),
            "tokens": {
                "accessToken": access_token,
                "refreshToken": format!("refresh-{}", access_token),
                "expiresAt": NOW + 3_600_000,
                "tokenType": "Bearer"
            }
        },
        "success": true
    })
}

pub struct TestService {
    pub service: AuthService,
    pub transport: Arc<MockTransport>,
    pub storage: Arc<MemoryStorage>,
    pub vault: Arc<Vault>,
    pub tokens: Arc<TokenStore>,
    pub clock: Arc<ManualClock>,
    pub network: ConnectivityMonitor,
    pub authenticator: Arc<SimulatedAuthenticator>,
    pub changes: Arc<Mutex<Vec<SessionStateChanged>>>,
}

impl TestService {
    pub fn new() -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let transport = Arc::new(MockTransport::default());
        let authenticator = Arc::new(SimulatedAuthenticator::enrolled(vec![BiometricType::Face]));
        let network = ConnectivityMonitor::default();
        Self::build(storage, transport, authenticator, network)
    }

    fn build(
        storage: Arc<MemoryStorage>,
        transport: Arc<MockTransport>,
        authenticator: Arc<SimulatedAuthenticator>,
        network: ConnectivityMonitor,
    ) -> Self {
        let vault = Arc::new(Vault::open(storage.clone()).unwrap());
        let clock = Arc::new(ManualClock::new(NOW));
        let tokens = Arc::new(TokenStore::with_clock(vault.clone(), clock.clone()));
        let config = ClientConfig {
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_millis(500),
            max_retries: 1,
            retry_delay: Duration::from_millis(1),
            ..ClientConfig::default()
        };
        let client = ApiClient::new(
            config,
            transport.clone(),
            vault.clone(),
            tokens.clone(),
            network.clone(),
        )
        .unwrap();
        let guard = Arc::new(BiometricGuard::new(vault.clone(), authenticator.clone()));
        let service = AuthService::new(client, guard);

        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = changes.clone();
        service.set_state_callback(Box::new(move |change| {
            sink.lock().unwrap().push(change);
        }));

        Self {
            service,
            transport,
            storage,
            vault,
            tokens,
            clock,
            network,
            authenticator,
            changes,
        }
    }

    /// A fresh service over the same storage, device and server.
    pub fn restart(&self) -> Self {
        Self::build(
            self.storage.clone(),
            self.transport.clone(),
            self.authenticator.clone(),
            self.network.clone(),
        )
    }

    /// Persist a session without going through login.
    pub fn seed_tokens(&self, access_token: &str, expires_at: i64) {
        self.tokens
            .store_tokens(&TokenPair::new(access_token, "refresh-seeded", expires_at))
            .unwrap();
    }

    /// Log in as `u1` with access token `access-1`.
    pub async fn logged_in() -> Self {
        let t = Self::new();
        t.transport.always(
            HttpMethod::Post,
            "/auth/login",
            200,
            session_json("u1", "ada@example.com", "access-1"),
        );
        t.service
            .login(&crate::LoginCredentials::new("ada@example.com", "pw"))
            .await
            .unwrap();
        t.changes.lock().unwrap().clear();
        t
    }

    pub fn states(&self) -> Vec<crate::SessionState> {
        self.changes.lock().unwrap().iter().map(|c| c.state).collect()
    }
}
