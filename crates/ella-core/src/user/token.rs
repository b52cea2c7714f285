//! Bearer token issuing and hashing.
//!
//! Tokens are random, shown to the operator once, and only their hash is
//! stored. The hashing algorithm lives behind [`TokenHasher`]; the SHA-256
//! adapter is in ella-infra.

use uuid::Uuid;

/// Prefix every issued token carries.
pub const TOKEN_PREFIX: &str = "ella_";

/// Abstraction over token hashing.
pub trait TokenHasher: Send + Sync {
    /// Hex-encoded hash of `token`.
    fn hash_token(&self, token: &str) -> String;
}

/// A new random bearer token: the prefix followed by 64 hex characters.
pub fn generate_token() -> String {
    format!(
        "{TOKEN_PREFIX}{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}
