//! SHA-256 bearer token hashing.
//!
//! Implements the `TokenHasher` trait from `ella-core` using the `sha2`
//! crate (RustCrypto ecosystem).

use sha2::{Digest, Sha256};

use ella_core::user::token::TokenHasher;

/// SHA-256 implementation of `TokenHasher`.
///
/// Produces lowercase hex digests; this is the form stored in
/// `users.token_hash`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256TokenHasher;

impl Sha256TokenHasher {
    pub fn new() -> Self {
        Self
    }
}

impl TokenHasher for Sha256TokenHasher {
    fn hash_token(&self, token: &str) -> String {
        let digest = Sha256::digest(token.as_bytes());
        format!("{:x}", digest)
    }
}
