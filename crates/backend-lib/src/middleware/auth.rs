// ============================
// crates/backend-lib/src/middleware/auth.rs
// ============================
//! Bearer-token admission for protected routes.
use crate::auth::TokenCodec;
use crate::error::AppError;
use crate::metrics::GATE_REJECTED;
use crate::store::{SessionStore, BLACKLISTED};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use medika_common::{PrincipalId, Role};
use std::sync::Arc;
use tracing::{debug, error};

/// Identity of an admitted request, taken from the access token claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub principal_id: PrincipalId,
    pub email: String,
    pub role: Role,
}

/// Raw access token of an admitted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

/// Why a request was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingHeader,
    MalformedHeader,
    Revoked,
    InvalidToken,
    /// Blacklist lookup failed; the request is refused rather than let through
    StoreUnavailable,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::MissingHeader => "Authorization header is required",
            Rejection::MalformedHeader => "Invalid authorization header format",
            Rejection::Revoked => "Token has been invalidated",
            Rejection::InvalidToken => "Invalid Token",
            Rejection::StoreUnavailable => "Internal server error",
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Rejection::MissingHeader => "missing_header",
            Rejection::MalformedHeader => "malformed_header",
            Rejection::Revoked => "revoked",
            Rejection::InvalidToken => "invalid_token",
            Rejection::StoreUnavailable => "store_unavailable",
        }
    }
}

/// Extract the token from a `Bearer <token>` header value
pub fn bearer_token(header: &str) -> Result<&str, Rejection> {
    if header.is_empty() {
        return Err(Rejection::MissingHeader);
    }
    match header.split_once(' ') {
        Some(("Bearer", token)) if !token.is_empty() && !token.contains(' ') => Ok(token),
        _ => Err(Rejection::MalformedHeader),
    }
}

/// Admits requests carrying a signed, unexpired, non-blacklisted access token
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    store: Arc<dyn SessionStore>,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn SessionStore>) -> Self {
        Self { codec, store }
    }

    /// Run the admission checks against an `Authorization` header value
    pub async fn admit(&self, header: Option<&str>) -> Result<(AuthContext, BearerToken), Rejection> {
        let token = bearer_token(header.unwrap_or_default())?;

        // Revoked tokens are turned away before any signature work.
        match self.store.get(token).await {
            Ok(Some(value)) if value == BLACKLISTED => return Err(Rejection::Revoked),
            Ok(_) => {},
            Err(err) => {
                error!(error = %err, "Blacklist lookup failed");
                return Err(Rejection::StoreUnavailable);
            },
        }

        let claims = self.codec.parse_access(token).map_err(|err| {
            debug!(error = %err, "Access token rejected");
            Rejection::InvalidToken
        })?;

        let context = AuthContext {
            principal_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        };
        Ok((context, BearerToken(token.to_string())))
    }
}

/// Middleware guarding routes behind the auth gate
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| reject(Rejection::MalformedHeader))?),
        None => None,
    };

    let (context, token) = state.gate.admit(header).await.map_err(reject)?;

    request.extensions_mut().insert(context);
    request.extensions_mut().insert(token);
    Ok(next.run(request).await)
}

fn reject(rejection: Rejection) -> AppError {
    ::metrics::counter!(GATE_REJECTED, "reason" => rejection.reason()).increment(1);
    debug!(reason = rejection.reason(), "Request rejected by auth gate");
    rejection.into()
}
