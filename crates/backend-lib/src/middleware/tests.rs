use super::*;
use crate::auth::password::fast_verifier;
use crate::auth::CredentialVerifier;
use crate::config::Settings;
use crate::storage::{FlatFileStorage, NewPrincipal, PrincipalStore};
use crate::store::{MemorySessionStore, SessionStore, BLACKLISTED};
use crate::AppState;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Extension, Router,
};
use chrono::Utc;
use figment::{providers::{Format, Toml}, Figment};
use medika_common::Role;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

struct Harness {
    app: Router,
    state: Arc<AppState>,
    store: MemorySessionStore,
    _temp_dir: TempDir,
}

async fn whoami(Extension(context): Extension<AuthContext>) -> String {
    format!("{}:{}", context.principal_id, context.role)
}

async fn harness() -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let settings = Settings::from_figment(Figment::new().merge(Toml::string(
        r#"
        [jwt]
        secret = "middleware-secret"
        access_ttl_secs = 900
        refresh_ttl_secs = 3600
        "#,
    )))
    .unwrap();

    let verifier = fast_verifier();
    let storage = FlatFileStorage::open(temp_dir.path()).await.unwrap();
    for (email, role) in [("admin@x.com", Role::Admin), ("user@x.com", Role::User)] {
        storage
            .create(NewPrincipal {
                name: email.into(),
                email: email.into(),
                password_hash: verifier.hash("Pass1234!").unwrap(),
                role,
            })
            .await
            .unwrap();
    }

    let store = MemorySessionStore::new();
    let state = Arc::new(
        AppState::new(settings, Arc::new(store.clone()), Arc::new(storage), Arc::new(verifier)).unwrap(),
    );

    let admin_only = Router::new()
        .route("/admin", get(whoami))
        .route_layer(middleware::from_fn_with_state(ADMIN_ROLES, require_role));
    let app = Router::new()
        .route("/whoami", get(whoami))
        .merge(admin_only)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    Harness {
        app,
        state,
        store,
        _temp_dir: temp_dir,
    }
}

async fn call(app: &Router, uri: &str, auth: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = auth {
        builder = builder.header("authorization", value);
    }
    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn token_for(h: &Harness, email: &str) -> String {
    h.state.sessions.login(email, "Pass1234!").await.unwrap().access.value
}

#[tokio::test]
async fn test_admitted_request_sees_identity() {
    let h = harness().await;
    let token = token_for(&h, "user@x.com").await;

    let (status, body) = call(&h.app, "/whoami", Some(&format!("Bearer {token}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "2:user");
}

#[tokio::test]
async fn test_rejections_are_401_with_reason() {
    let h = harness().await;
    let cases = [
        (None, "Authorization header is required"),
        (Some(""), "Authorization header is required"),
        (Some("Bearer"), "Invalid authorization header format"),
        (Some("Bearer "), "Invalid authorization header format"),
        (Some("Basic xyz"), "Invalid authorization header format"),
        (Some("Bearer not-a-jwt"), "Invalid Token"),
    ];

    for (header, message) in cases {
        let (status, body) = call(&h.app, "/whoami", header).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{header:?}");
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"], message, "{header:?}");
    }
}

#[tokio::test]
async fn test_revoked_token_is_rejected() {
    let h = harness().await;
    let token = token_for(&h, "user@x.com").await;
    h.store.set(&token, BLACKLISTED, Duration::from_secs(60)).await.unwrap();

    let (status, body) = call(&h.app, "/whoami", Some(&format!("Bearer {token}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Token has been invalidated"));
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let h = harness().await;
    let expired = h
        .state
        .sessions
        .codec()
        .mint_access(2, "user@x.com", Role::User, Utc::now() - chrono::Duration::hours(2))
        .unwrap();

    let (status, _) = call(&h.app, "/whoami", Some(&format!("Bearer {}", expired.value))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_gate() {
    let h = harness().await;
    let admin = token_for(&h, "admin@x.com").await;
    let user = token_for(&h, "user@x.com").await;

    let (status, body) = call(&h.app, "/admin", Some(&format!("Bearer {admin}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1:admin");

    let (status, body) = call(&h.app, "/admin", Some(&format!("Bearer {user}"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Insufficient permissions"));
}

#[tokio::test]
async fn test_role_gate_without_identity() {
    let app: Router = Router::new()
        .route("/admin", get(|| async { "unreachable" }))
        .route_layer(middleware::from_fn_with_state(ADMIN_ROLES, require_role));

    let (status, body) = call(&app, "/admin", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Role not found"));
}
