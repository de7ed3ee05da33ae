// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! `/users` handlers.
use super::success;
use crate::error::AppError;
use crate::middleware::AuthContext;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use medika_common::{
    ChangePasswordRequest, CreateUserRequest, ListUsersQuery, PrincipalId, SuccessResponse, UpdateUserRequest,
    UserResponse,
};
use std::sync::Arc;
use zeroize::Zeroize;

pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
) -> Result<Json<UserResponse>, AppError> {
    let principal = state.users.get_user(context.principal_id).await?;
    Ok(Json(principal.profile()))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let Json(req) = payload?;
    let principal = state.users.update_user(context.principal_id, req).await?;
    Ok(Json(principal.profile()))
}

pub async fn change_my_password(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Json(mut req) = payload?;

    let result = state
        .users
        .change_password(context.principal_id, &req.old_password, &req.new_password)
        .await;
    req.old_password.zeroize();
    req.new_password.zeroize();

    result?;
    Ok(success("Password changed successfully"))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(req) = payload?;
    let principal = state.users.create_user(req).await?;
    Ok((StatusCode::CREATED, Json(principal.profile())))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let Query(query) = query?;
    let principals = state.users.list_users(&query).await?;
    Ok(Json(principals.iter().map(|p| p.profile()).collect()))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    id: Result<Path<PrincipalId>, PathRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Path(id) = id?;
    state.users.delete_user(id).await?;
    Ok(success("User deleted successfully"))
}
