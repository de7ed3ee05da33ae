// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const LOGIN_SUCCEEDED: &str = "login.succeeded";
pub const LOGIN_FAILED: &str = "login.failed";
pub const LOGOUT: &str = "logout";
pub const TOKEN_REFRESHED: &str = "token.refreshed";
pub const SESSIONS_INVALIDATED: &str = "session.invalidated";
pub const GATE_REJECTED: &str = "gate.rejected";
