//! Salted password digests.
//!
//! Passwords are write-only: they are accepted on input, digested here and
//! never leave the process again. A digest is stored as `<salt>$<sha256-hex>`.

use sha2::{Digest, Sha256};
use uuid::Uuid;

const SEPARATOR: char = '$';

/// Produce a freshly salted SHA-256 digest of `password`.
pub fn digest_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let hash = salted_hash(&salt, password);
    format!("{salt}{SEPARATOR}{hash}")
}

/// Check `candidate` against a digest produced by [`digest_password`].
///
/// Malformed digests never match.
pub fn verify_password(digest: &str, candidate: &str) -> bool {
    match digest.split_once(SEPARATOR) {
        Some((salt, hash)) if !salt.is_empty() => salted_hash(salt, candidate) == hash,
        _ => false,
    }
}

fn salted_hash(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}
