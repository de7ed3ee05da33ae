// ============================
// crates/backend-lib/src/middleware/role.rs
// ============================
//! Role allow-lists, layered after [`require_auth`](super::require_auth).
use super::auth::AuthContext;
use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use medika_common::Role;
use tracing::warn;

/// Roles permitted to manage other users
pub const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];

/// Use with `middleware::from_fn_with_state(ADMIN_ROLES, require_role)`
pub async fn require_role(
    State(allowed): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(context) = request.extensions().get::<AuthContext>() else {
        warn!("Role check without an admitted identity");
        return Err(AppError::Forbidden("Role not found".into()));
    };

    if !allowed.contains(&context.role) {
        warn!(principal_id = context.principal_id, role = %context.role, "Insufficient permissions");
        return Err(AppError::Forbidden("Insufficient permissions".into()));
    }

    Ok(next.run(request).await)
}
