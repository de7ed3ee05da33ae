// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers.

pub mod auth;
pub mod users;

use axum::Json;
use medika_common::SuccessResponse;

/// Liveness probe
pub async fn health() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "ok".to_string(),
    })
}

pub(crate) fn success(message: &str) -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: message.to_string(),
    })
}
