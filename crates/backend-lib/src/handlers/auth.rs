// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! `/auth` handlers.
use super::success;
use crate::auth::TokenPair;
use crate::error::{AppError, INVALID_CREDENTIALS, INVALID_REFRESH_TOKEN};
use crate::middleware::{AuthContext, BearerToken};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use medika_common::{LoginRequest, RefreshTokenRequest, SuccessResponse, TokenResponse, UserResponse};
use std::sync::Arc;
use tracing::error;
use zeroize::Zeroize;

fn token_response(pair: TokenPair) -> Json<TokenResponse> {
    Json(TokenResponse {
        access_token: pair.access.value,
        refresh_token: pair.refresh.value,
    })
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(LoginRequest { email, mut password }) = payload?;

    let result = state.sessions.login(&email, &password).await;
    password.zeroize();

    match result {
        Ok(pair) => Ok(token_response(pair)),
        Err(err) if err.is_client_error() => Err(AppError::unauthorized(INVALID_CREDENTIALS)),
        Err(err) => Err(err.into()),
    }
}

/// Any failure is reported as an invalid refresh token
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(req) = payload?;

    match state.sessions.refresh_token(&req.refresh_token).await {
        Ok(pair) => Ok(token_response(pair)),
        Err(err) => {
            if !err.is_client_error() {
                error!(error = %err, "Token refresh failed");
            }
            Err(AppError::unauthorized(INVALID_REFRESH_TOKEN))
        },
    }
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.sessions.logout(&token, context.principal_id).await?;
    Ok(success("Successfully logged out"))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
) -> Result<Json<UserResponse>, AppError> {
    let principal = state.users.get_user(context.principal_id).await?;
    Ok(Json(principal.profile()))
}
