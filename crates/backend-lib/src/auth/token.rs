// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
/** Signed bearer tokens.
Access and refresh tokens are self-contained HS256 JWTs. Validity is decided
by signature and expiry alone; the session store only records revocations. */
use super::AuthError;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use medika_common::{PrincipalId, Role};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: PrincipalId,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    /// Random id so tokens minted within the same second differ
    pub jti: String,
}

impl AccessClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Time left before expiry, `None` once expired
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.expires_at() - now).to_std().ok().filter(|d| !d.is_zero())
    }
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Decimal principal id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// A freshly minted access token
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub claims: AccessClaims,
}

/// A freshly minted refresh token
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Access + refresh pair returned by login and refresh
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: AccessToken,
    pub refresh: RefreshToken,
}

/// Mints and parses tokens with a shared secret
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::TokenMint("signing secret is empty".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl,
            refresh_ttl,
        })
    }

    /// Configured access-token lifetime
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Configured refresh-token lifetime
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn mint_access(
        &self,
        principal_id: PrincipalId,
        email: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, AuthError> {
        let claims = AccessClaims {
            user_id: principal_id,
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: expiry(now, self.access_ttl)?,
            jti: Uuid::new_v4().to_string(),
        };
        let value = self.sign(&claims)?;
        Ok(AccessToken { value, claims })
    }

    pub fn mint_refresh(&self, principal_id: PrincipalId, now: DateTime<Utc>) -> Result<RefreshToken, AuthError> {
        let claims = RefreshClaims {
            sub: principal_id.to_string(),
            iat: now.timestamp(),
            exp: expiry(now, self.refresh_ttl)?,
            jti: Uuid::new_v4().to_string(),
        };
        let value = self.sign(&claims)?;
        let expires_at = Utc.timestamp_opt(claims.exp, 0).single().unwrap_or(now);
        Ok(RefreshToken { value, expires_at })
    }

    /// Verify signature and expiry of an access token
    pub fn parse_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        decode::<AccessClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Verify a refresh token and return the principal it was issued to
    pub fn parse_refresh(&self, token: &str) -> Result<PrincipalId, AuthError> {
        let claims = decode::<RefreshClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        claims
            .sub
            .parse::<PrincipalId>()
            .map_err(|_| AuthError::MalformedSubject(claims.sub))
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::TokenMint(e.to_string()))
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<i64, AuthError> {
    let ttl = i64::try_from(ttl.as_secs())
        .map_err(|_| AuthError::TokenMint("token lifetime out of range".into()))?;
    now.timestamp()
        .checked_add(ttl)
        .ok_or_else(|| AuthError::TokenMint("token expiry out of range".into()))
}
