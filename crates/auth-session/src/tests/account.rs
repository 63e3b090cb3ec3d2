use super::harness::{session_json, user_json, TestService};
use crate::{
    AuthError, ChangePasswordRequest, LoginCredentials, LoginOutcome, MfaVerification,
    ResetPasswordConfirm, SessionState,
};
use resilient_client::HttpMethod;
use serde_json::json;

fn code(code: &str) -> MfaVerification {
    MfaVerification {
        code: code.to_string(),
        backup_code: None,
    }
}

#[tokio::test]
async fn test_reset_password_is_unauthenticated() {
    let t = TestService::logged_in().await;
    t.transport
        .always(HttpMethod::Post, "/auth/reset-password", 200, json!({}));

    t.service.reset_password("ada@example.com").await.unwrap();

    let sent = &t.transport.requests_to(HttpMethod::Post, "/auth/reset-password")[0];
    assert_eq!(sent.header("authorization"), None);
    assert_eq!(sent.body, Some(json!({ "email": "ada@example.com" })));
}

#[tokio::test]
async fn test_confirm_reset_password_signs_in() {
    let t = TestService::new();
    t.transport.always(
        HttpMethod::Post,
        "/auth/confirm-reset-password",
        200,
        session_json("u1", "ada@example.com", "access-9"),
    );

    let user = t
        .service
        .confirm_reset_password(&ResetPasswordConfirm {
            token: "reset-token".to_string(),
            new_password: "new".to_string(),
            confirm_password: "new".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(t.service.state(), SessionState::Authenticated);
    assert_eq!(
        t.tokens.get_access_token().unwrap().as_deref(),
        Some("access-9")
    );

    let sent = &t.transport.requests_to(HttpMethod::Post, "/auth/confirm-reset-password")[0];
    assert_eq!(sent.body.as_ref().unwrap()["newPassword"], "new");
}

#[tokio::test]
async fn test_confirm_reset_with_expired_token() {
    let t = TestService::new();
    t.transport.always(
        HttpMethod::Post,
        "/auth/confirm-reset-password",
        400,
        json!({ "message": "Reset link expired" }),
    );

    let err = t
        .service
        .confirm_reset_password(&ResetPasswordConfirm {
            token: "old".to_string(),
            new_password: "new".to_string(),
            confirm_password: "new".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials(ref m) if m == "Reset link expired"));
    assert_eq!(t.service.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_change_password_uses_session() {
    let t = TestService::logged_in().await;
    t.transport
        .always(HttpMethod::Post, "/auth/change-password", 200, json!({}));

    t.service
        .change_password(&ChangePasswordRequest {
            current_password: "pw".to_string(),
            new_password: "better".to_string(),
            confirm_password: "better".to_string(),
        })
        .await
        .unwrap();

    let sent = &t.transport.requests_to(HttpMethod::Post, "/auth/change-password")[0];
    assert_eq!(sent.header("authorization"), Some("Bearer access-1"));
    assert_eq!(
        sent.body,
        Some(json!({
            "currentPassword": "pw",
            "newPassword": "better",
            "confirmPassword": "better"
        }))
    );
}

#[tokio::test]
async fn test_mfa_login_flow() {
    let t = TestService::new();
    t.service.initialize().await.unwrap();
    t.transport.always(
        HttpMethod::Post,
        "/auth/login",
        200,
        json!({ "data": { "mfaRequired": true }, "success": true }),
    );
    t.transport.always(
        HttpMethod::Post,
        "/auth/mfa/verify",
        200,
        session_json("u1", "ada@example.com", "access-mfa"),
    );

    let outcome = t
        .service
        .login(&LoginCredentials::new("ada@example.com", "pw"))
        .await
        .unwrap();
    assert_eq!(outcome, LoginOutcome::MfaRequired);
    assert_eq!(t.service.state(), SessionState::MfaPending);
    assert!(t.service.mfa_required());
    assert!(t.tokens.get_tokens().unwrap().is_none());

    let user = t.service.verify_mfa(&code("123456")).await.unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(t.service.state(), SessionState::Authenticated);
    assert!(!t.service.mfa_required());
    assert_eq!(
        t.tokens.get_access_token().unwrap().as_deref(),
        Some("access-mfa")
    );

    let verify = &t.transport.requests_to(HttpMethod::Post, "/auth/mfa/verify")[0];
    assert_eq!(verify.body, Some(json!({ "code": "123456" })));
}

#[tokio::test]
async fn test_mfa_wrong_code_stays_pending() {
    let t = TestService::new();
    t.transport.always(
        HttpMethod::Post,
        "/auth/login",
        200,
        json!({ "mfaRequired": true }),
    );
    t.transport.once(
        HttpMethod::Post,
        "/auth/mfa/verify",
        401,
        json!({ "message": "Invalid code" }),
    );
    t.transport.always(
        HttpMethod::Post,
        "/auth/mfa/verify",
        200,
        session_json("u1", "ada@example.com", "access-mfa"),
    );

    t.service
        .login(&LoginCredentials::new("ada@example.com", "pw"))
        .await
        .unwrap();

    let err = t.service.verify_mfa(&code("000000")).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials(ref m) if m == "Invalid code"));
    assert_eq!(t.service.state(), SessionState::MfaPending);
    assert_eq!(t.transport.count(HttpMethod::Post, "/auth/refresh"), 0);

    t.service.verify_mfa(&code("123456")).await.unwrap();
    assert_eq!(t.service.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_verify_mfa_requires_pending_or_session() {
    let t = TestService::new();
    t.service.initialize().await.unwrap();

    let err = t.service.verify_mfa(&code("123456")).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidStateTransition(_)));
    assert_eq!(t.transport.total(), 0);
}

#[tokio::test]
async fn test_setup_and_enable_mfa_from_session() {
    let t = TestService::logged_in().await;
    t.transport.always(
        HttpMethod::Post,
        "/auth/mfa/setup",
        200,
        json!({
            "data": { "secret": "JBSWY3DP", "qrCode": "data:image/png;base64,AAAA", "backupCodes": ["a1", "b2"] },
            "success": true
        }),
    );
    t.transport.always(
        HttpMethod::Post,
        "/auth/mfa/verify",
        200,
        session_json("u1", "ada@example.com", "access-2"),
    );

    let setup = t.service.setup_mfa().await.unwrap();
    assert_eq!(setup.secret, "JBSWY3DP");
    assert_eq!(setup.backup_codes, vec!["a1", "b2"]);

    t.service.verify_mfa(&code("123456")).await.unwrap();
    assert_eq!(t.service.state(), SessionState::Authenticated);
    let verify = &t.transport.requests_to(HttpMethod::Post, "/auth/mfa/verify")[0];
    assert_eq!(verify.header("authorization"), Some("Bearer access-1"));
}

#[tokio::test]
async fn test_setup_mfa_requires_login() {
    let t = TestService::new();
    let err = t.service.setup_mfa().await.unwrap_err();
    assert!(matches!(err, AuthError::NotLoggedIn));
    assert_eq!(t.transport.total(), 0);
}

#[tokio::test]
async fn test_disable_mfa_reloads_profile() {
    let t = TestService::logged_in().await;
    let mut updated = user_json("u1", "ada@example.com");
    updated["firstName"] = json!("Augusta");
    t.transport
        .always(HttpMethod::Post, "/auth/mfa/disable", 200, json!({}));
    t.transport
        .always(HttpMethod::Get, "/auth/profile", 200, updated);

    let user = t.service.disable_mfa("123456").await.unwrap();
    assert_eq!(user.first_name, "Augusta");
    assert_eq!(t.service.current_user().unwrap().first_name, "Augusta");

    let sent = &t.transport.requests_to(HttpMethod::Post, "/auth/mfa/disable")[0];
    assert_eq!(sent.body, Some(json!({ "code": "123456" })));
}

#[tokio::test]
async fn test_expired_session_during_call() {
    let t = TestService::logged_in().await;
    t.transport.always(
        HttpMethod::Post,
        "/auth/mfa/disable",
        401,
        json!({ "message": "expired" }),
    );
    t.transport.always(
        HttpMethod::Post,
        "/auth/refresh",
        401,
        json!({ "message": "revoked" }),
    );

    let err = t.service.disable_mfa("123456").await.unwrap_err();
    assert!(matches!(err, AuthError::SessionExpired));
    assert_eq!(t.service.state(), SessionState::Unauthenticated);
    assert!(t.service.current_user().is_none());
    assert!(t.tokens.get_tokens().unwrap().is_none());
}

#[tokio::test]
async fn test_permissions_and_roles() {
    let t = TestService::new();
    assert!(!t.service.has_permission("posts", "update"));
    assert!(!t.service.has_role("editor"));

    let t = TestService::logged_in().await;
    assert!(t.service.has_permission("posts", "update"));
    assert!(!t.service.has_permission("posts", "delete"));
    assert!(t.service.has_role("editor"));
    assert!(!t.service.has_role("admin"));
}
