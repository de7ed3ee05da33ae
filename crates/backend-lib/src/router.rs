// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP routing.
use crate::handlers::{self, auth, users};
use crate::middleware::{require_auth, require_role, ADMIN_ROLES};
use crate::AppState;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh));

    let authenticated = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/users/me", get(users::get_me).put(users::update_me))
        .route("/users/me/password", put(users::change_my_password));

    // Role gate runs after the auth gate has attached an identity.
    let admin = Router::new()
        .route("/users", post(users::create_user).get(users::list_users))
        .route("/users/{id}", delete(users::delete_user))
        .route_layer(middleware::from_fn_with_state(ADMIN_ROLES, require_role));

    let protected = authenticated
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
