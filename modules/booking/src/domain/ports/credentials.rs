use crate::domain::repo::PasswordDigest;

/// Password hashing and session token minting, kept out of the domain.
pub trait CredentialsPort: Send + Sync {
    /// Hash a password with a fresh salt.
    fn hash_password(&self, password: &str) -> anyhow::Result<PasswordDigest>;
    fn verify_password(&self, password: &str, digest: &PasswordDigest) -> bool;
    /// A new random bearer token.
    fn new_token(&self) -> String;
    /// Stable digest of a token; only this is persisted.
    fn token_digest(&self, token: &str) -> String;
}
