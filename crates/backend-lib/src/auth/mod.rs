// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication: credentials, signed tokens and the session lifecycle.

pub mod error;
pub mod password;
pub mod session;
pub mod token;

pub use error::AuthError;
pub use password::{CredentialVerifier, PhcVerifier};
pub use session::SessionManager;
pub use token::{AccessClaims, AccessToken, RefreshClaims, RefreshToken, TokenCodec, TokenPair};
