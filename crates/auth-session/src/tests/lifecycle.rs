use super::harness::{session_json, user_json, TestService, NOW};
use crate::{AuthError, LoginCredentials, LoginOutcome, RegisterData, SessionState};
use resilient_client::{ClientError, HttpMethod};
use serde_json::json;

#[tokio::test]
async fn test_initialize_without_session() {
    let t = TestService::new();
    let state = t.service.initialize().await.unwrap();

    assert_eq!(state, SessionState::Unauthenticated);
    assert_eq!(t.transport.total(), 0);
    assert!(t.service.current_user().is_none());
    assert_eq!(
        t.states(),
        vec![SessionState::Initializing, SessionState::Unauthenticated]
    );
}

#[tokio::test]
async fn test_initialize_restores_valid_session() {
    let t = TestService::new();
    t.seed_tokens("access-1", NOW + 3_600_000);
    t.transport.always(
        HttpMethod::Get,
        "/auth/profile",
        200,
        json!({ "data": user_json("u1", "ada@example.com"), "success": true }),
    );

    let state = t.service.initialize().await.unwrap();
    assert_eq!(state, SessionState::Authenticated);
    assert_eq!(t.service.current_user().unwrap().id, "u1");
    assert_eq!(t.transport.count(HttpMethod::Post, "/auth/refresh"), 0);

    let profile = t.transport.requests_to(HttpMethod::Get, "/auth/profile");
    assert_eq!(profile[0].header("authorization"), Some("Bearer access-1"));

    let changes = t.changes.lock().unwrap().clone();
    assert_eq!(changes.last().unwrap().state, SessionState::Authenticated);
    assert_eq!(changes.last().unwrap().user_id.as_deref(), Some("u1"));
}

#[tokio::test]
async fn test_initialize_refreshes_expiring_token() {
    let t = TestService::new();
    // Inside the five minute buffer
    t.seed_tokens("access-old", NOW + 60_000);
    t.transport.always(
        HttpMethod::Post,
        "/auth/refresh",
        200,
        json!({ "data": { "accessToken": "access-new", "expiresAt": NOW + 3_600_000 }, "success": true }),
    );
    t.transport.always(
        HttpMethod::Get,
        "/auth/profile",
        200,
        user_json("u1", "ada@example.com"),
    );

    let state = t.service.initialize().await.unwrap();
    assert_eq!(state, SessionState::Authenticated);

    let refresh = t.transport.requests_to(HttpMethod::Post, "/auth/refresh");
    assert_eq!(refresh.len(), 1);
    assert_eq!(refresh[0].body, Some(json!({ "refreshToken": "refresh-seeded" })));
    let profile = t.transport.requests_to(HttpMethod::Get, "/auth/profile");
    assert_eq!(profile[0].header("authorization"), Some("Bearer access-new"));
}

#[tokio::test]
async fn test_initialize_with_revoked_refresh_token() {
    let t = TestService::new();
    t.seed_tokens("access-old", NOW - 1);
    t.transport.always(
        HttpMethod::Post,
        "/auth/refresh",
        401,
        json!({ "message": "revoked" }),
    );

    let state = t.service.initialize().await.unwrap();
    assert_eq!(state, SessionState::Unauthenticated);
    assert!(t.tokens.get_tokens().unwrap().is_none());
    assert_eq!(t.transport.count(HttpMethod::Get, "/auth/profile"), 0);
}

#[tokio::test]
async fn test_initialize_profile_failure_keeps_tokens() {
    let t = TestService::new();
    t.seed_tokens("access-1", NOW + 3_600_000);
    t.transport.always(
        HttpMethod::Get,
        "/auth/profile",
        503,
        json!({ "message": "maintenance" }),
    );

    let err = t.service.initialize().await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(t.service.state(), SessionState::Unauthenticated);
    assert!(t.tokens.get_tokens().unwrap().is_some());

    // A later attempt can still restore
    t.transport.always(
        HttpMethod::Get,
        "/auth/profile",
        200,
        user_json("u1", "ada@example.com"),
    );
    assert_eq!(
        t.service.initialize().await.unwrap(),
        SessionState::Authenticated
    );
}

#[tokio::test]
async fn test_initialize_twice_is_rejected() {
    let t = TestService::new();
    t.seed_tokens("access-1", NOW + 3_600_000);
    t.transport.always(
        HttpMethod::Get,
        "/auth/profile",
        200,
        user_json("u1", "ada@example.com"),
    );
    t.service.initialize().await.unwrap();

    let err = t.service.initialize().await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidStateTransition(_)));
    assert_eq!(t.service.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_login_success() {
    let t = TestService::new();
    t.service.initialize().await.unwrap();
    t.transport.always(
        HttpMethod::Post,
        "/auth/login",
        200,
        session_json("u1", "ada@example.com", "access-1"),
    );

    let outcome = t
        .service
        .login(&LoginCredentials::new("ada@example.com", "pw"))
        .await
        .unwrap();
    match outcome {
        LoginOutcome::Authenticated(user) => assert_eq!(user.email, "ada@example.com"),
        other => panic!("expected Authenticated, got {:?}", other),
    }
    assert_eq!(t.service.state(), SessionState::Authenticated);
    assert_eq!(
        t.tokens.get_access_token().unwrap().as_deref(),
        Some("access-1")
    );

    let sent = &t.transport.requests_to(HttpMethod::Post, "/auth/login")[0];
    assert_eq!(sent.header("authorization"), None);
    assert_eq!(
        sent.body,
        Some(json!({ "email": "ada@example.com", "password": "pw", "rememberMe": false }))
    );
}

#[tokio::test]
async fn test_login_rejected() {
    let t = TestService::new();
    t.service.initialize().await.unwrap();
    t.transport.always(
        HttpMethod::Post,
        "/auth/login",
        401,
        json!({ "message": "Invalid email or password" }),
    );

    let err = t
        .service
        .login(&LoginCredentials::new("ada@example.com", "wrong"))
        .await
        .unwrap_err();
    match err {
        AuthError::InvalidCredentials(message) => {
            assert_eq!(message, "Invalid email or password")
        }
        other => panic!("expected InvalidCredentials, got {:?}", other),
    }
    assert_eq!(t.service.state(), SessionState::Unauthenticated);
    // Credential exchanges never trigger a refresh
    assert_eq!(t.transport.count(HttpMethod::Post, "/auth/refresh"), 0);
    assert!(t.tokens.get_tokens().unwrap().is_none());
}

#[tokio::test]
async fn test_login_response_without_tokens_fails() {
    let t = TestService::new();
    t.transport.always(
        HttpMethod::Post,
        "/auth/login",
        200,
        json!({ "data": { "user": user_json("u1", "a@b.c") }, "success": true }),
    );

    let err = t
        .service
        .login(&LoginCredentials::new("a@b.c", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidResponse(_)));
    assert_eq!(t.service.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_login_offline_is_not_queued() {
    let t = TestService::new();
    t.network.set_connected(false);
    t.transport.always(
        HttpMethod::Post,
        "/auth/login",
        200,
        session_json("u1", "ada@example.com", "access-1"),
    );

    // The request is attempted rather than persisted with the password
    t.service
        .login(&LoginCredentials::new("ada@example.com", "pw"))
        .await
        .unwrap();
    assert_eq!(t.service.client().offline_queue_len(), 0);
}

#[tokio::test]
async fn test_register_signs_in() {
    let t = TestService::new();
    t.transport.always(
        HttpMethod::Post,
        "/auth/register",
        201,
        session_json("u2", "grace@example.com", "access-2"),
    );

    let user = t
        .service
        .register(&RegisterData {
            email: "grace@example.com".to_string(),
            password: "pw".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            confirm_password: "pw".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.id, "u2");
    assert_eq!(t.service.state(), SessionState::Authenticated);

    let sent = &t.transport.requests_to(HttpMethod::Post, "/auth/register")[0];
    assert_eq!(sent.body.as_ref().unwrap()["firstName"], "Grace");
    assert_eq!(sent.body.as_ref().unwrap()["confirmPassword"], "pw");
}

#[tokio::test]
async fn test_logout_clears_session() {
    let t = TestService::logged_in().await;
    t.transport
        .always(HttpMethod::Post, "/auth/logout", 200, json!({}));

    t.service.logout().await.unwrap();

    assert_eq!(t.service.state(), SessionState::Unauthenticated);
    assert!(t.service.current_user().is_none());
    assert!(t.tokens.get_tokens().unwrap().is_none());
    assert_eq!(
        t.states(),
        vec![SessionState::LoggingOut, SessionState::Unauthenticated]
    );
    let sent = &t.transport.requests_to(HttpMethod::Post, "/auth/logout")[0];
    assert_eq!(sent.header("authorization"), Some("Bearer access-1"));
}

#[tokio::test]
async fn test_logout_survives_server_failure() {
    let t = TestService::logged_in().await;
    t.transport.always(
        HttpMethod::Post,
        "/auth/logout",
        500,
        json!({ "message": "boom" }),
    );

    t.service.logout().await.unwrap();
    assert_eq!(t.service.state(), SessionState::Unauthenticated);
    assert!(t.tokens.get_tokens().unwrap().is_none());
}

#[tokio::test]
async fn test_logout_offline_is_not_queued() {
    let t = TestService::logged_in().await;
    t.network.set_connected(false);

    t.service.logout().await.unwrap();
    assert_eq!(t.service.client().offline_queue_len(), 0);
    assert_eq!(t.service.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_refresh_auth() {
    let t = TestService::logged_in().await;
    t.transport.always(
        HttpMethod::Post,
        "/auth/refresh",
        200,
        json!({ "data": { "accessToken": "access-2", "expiresAt": NOW + 7_200_000 }, "success": true }),
    );

    t.service.refresh_auth().await.unwrap();
    assert_eq!(
        t.tokens.get_access_token().unwrap().as_deref(),
        Some("access-2")
    );
    assert_eq!(t.service.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_refresh_auth_failure_expires_session() {
    let t = TestService::logged_in().await;
    t.transport.always(
        HttpMethod::Post,
        "/auth/refresh",
        401,
        json!({ "message": "revoked" }),
    );

    let err = t.service.refresh_auth().await.unwrap_err();
    assert!(matches!(err, AuthError::SessionExpired));
    assert_eq!(t.service.state(), SessionState::Unauthenticated);
    assert!(t.service.current_user().is_none());
    assert!(t.tokens.get_tokens().unwrap().is_none());
    assert_eq!(t.states(), vec![SessionState::Unauthenticated]);
}

#[tokio::test]
async fn test_engine_errors_pass_through() {
    let t = TestService::logged_in().await;
    t.transport.always(
        HttpMethod::Post,
        "/auth/change-password",
        422,
        json!({ "message": "too short" }),
    );

    let err = t
        .service
        .change_password(&crate::ChangePasswordRequest {
            current_password: "pw".to_string(),
            new_password: "x".to_string(),
            confirm_password: "x".to_string(),
        })
        .await
        .unwrap_err();
    match err {
        AuthError::Client(ClientError::Http { status, message, .. }) => {
            assert_eq!(status, 422);
            assert_eq!(message, "too short");
        }
        other => panic!("expected Http, got {:?}", other),
    }
    assert_eq!(t.service.state(), SessionState::Authenticated);
}
