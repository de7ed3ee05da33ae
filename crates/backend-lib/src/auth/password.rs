// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use scrypt::Scrypt;

/// Opaque credential check used by login and password changes
pub trait CredentialVerifier: Send + Sync {
    /// `true` iff `secret` matches the stored `hash`
    fn verify(&self, secret: &str, hash: &str) -> bool;

    /// Hash a new secret for storage
    fn hash(&self, secret: &str) -> anyhow::Result<String>;
}

/// PHC-string verifier: hashes with Argon2id, verifies Argon2 and scrypt hashes
#[derive(Clone, Default)]
pub struct PhcVerifier {
    argon2: Argon2<'static>,
}

impl PhcVerifier {
    /// Argon2id with explicit cost parameters (memory in KiB)
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> anyhow::Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl CredentialVerifier for PhcVerifier {
    fn verify(&self, secret: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        // the hash string carries its own algorithm and parameters
        let algs: [&dyn PasswordVerifier; 2] = [&self.argon2, &Scrypt];
        parsed_hash.verify_password(&algs, secret).is_ok()
    }

    fn hash(&self, secret: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?
            .to_string();
        Ok(hash)
    }
}

#[cfg(test)]
pub(crate) fn fast_verifier() -> PhcVerifier {
    PhcVerifier::with_params(256, 1, 1).expect("valid test params")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrypt::password_hash::PasswordHasher as _;

    #[test]
    fn test_hash_and_verify() {
        let verifier = fast_verifier();
        let hash = verifier.hash("CorrectPass1!").unwrap();

        assert_ne!(hash, "CorrectPass1!");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verifier.verify("CorrectPass1!", &hash));
        assert!(!verifier.verify("wrong", &hash));
    }

    #[test]
    fn test_same_secret_gets_distinct_salts() {
        let verifier = fast_verifier();
        let a = verifier.hash("secret").unwrap();
        let b = verifier.hash("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_from_other_params_still_verifies() {
        let hash = fast_verifier().hash("secret").unwrap();
        let other = PhcVerifier::with_params(512, 2, 1).unwrap();
        assert!(other.verify("secret", &hash));
    }

    #[test]
    fn test_scrypt_hashes_verify() {
        let salt = SaltString::generate(&mut OsRng);
        let params = scrypt::Params::new(4, 8, 1, 32).unwrap();
        let hash = Scrypt
            .hash_password_customized(b"legacy-pass", None, None, params, &salt)
            .unwrap()
            .to_string();

        let verifier = fast_verifier();
        assert!(verifier.verify("legacy-pass", &hash));
        assert!(!verifier.verify("other", &hash));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        let verifier = fast_verifier();
        assert!(!verifier.verify("anything", ""));
        assert!(!verifier.verify("anything", "not-a-phc-string"));
        assert!(!verifier.verify("anything", "$2a$10$bcryptstylehashthatwedontsupport"));
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        assert!(PhcVerifier::with_params(0, 0, 0).is_err());
    }
}
