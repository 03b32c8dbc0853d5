use anyhow::anyhow;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sha2::{Digest, Sha256};

use crate::domain::ports::CredentialsPort;
use crate::domain::repo::PasswordDigest;

const TOKEN_LEN: usize = 32;

/// Argon2id passwords (PHC strings) and nanoid bearer tokens.
///
/// Tokens are random, so a plain SHA-256 digest is enough to store them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Credentials;

impl CredentialsPort for Argon2Credentials {
    fn hash_password(&self, password: &str) -> anyhow::Result<PasswordDigest> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {e}"))?;
        Ok(PasswordDigest(phc.to_string()))
    }

    fn verify_password(&self, password: &str, digest: &PasswordDigest) -> bool {
        let Ok(parsed) = PasswordHash::new(&digest.0) else {
            tracing::warn!("stored password hash is not a PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    fn new_token(&self) -> String {
        nanoid::nanoid!(TOKEN_LEN)
    }

    fn token_digest(&self, token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip() {
        let c = Argon2Credentials;
        let d = c.hash_password("secret1").unwrap();
        assert!(d.0.starts_with("$argon2id$"), "{}", d.0);
        assert!(c.verify_password("secret1", &d));
        assert!(!c.verify_password("secret2", &d));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let c = Argon2Credentials;
        let a = c.hash_password("secret1").unwrap();
        let b = c.hash_password("secret1").unwrap();
        assert_ne!(a, b);
        assert!(c.verify_password("secret1", &a));
        assert!(c.verify_password("secret1", &b));
    }

    #[test]
    fn malformed_digest_never_verifies() {
        let c = Argon2Credentials;
        let legacy = PasswordDigest(
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad".to_string(),
        );
        assert!(!c.verify_password("abc", &legacy));
        assert!(!c.verify_password("", &PasswordDigest(String::new())));
    }

    #[test]
    fn token_digest_is_stable_hex() {
        let c = Argon2Credentials;
        let t = c.new_token();
        assert_eq!(t.len(), TOKEN_LEN);
        assert_eq!(c.token_digest(&t), c.token_digest(&t));
        assert_ne!(c.token_digest(&t), t);
        assert_eq!(
            c.token_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
