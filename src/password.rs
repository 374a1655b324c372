//! Salted one-way hashing for seeded credentials.
//!
//! Stored format: `sha256:<iterations>$<salt>$<hex digest>`. The raw secret
//! never reaches the database.

use rand::distr::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SCHEME: &str = "sha256";
const ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect();
    let digest = digest_with_salt(&salt, password, ITERATIONS);
    format!("{SCHEME}:{ITERATIONS}${salt}${digest}")
}

/// Check a password against a stored hash. Malformed hashes verify as false
/// rather than erroring; comparison is constant-time.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((header, rest)) = stored.split_once('$') else {
        return false;
    };
    let Some((salt, expected)) = rest.split_once('$') else {
        return false;
    };
    let Some((scheme, iterations)) = header.split_once(':') else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let computed = digest_with_salt(salt, password, iterations);
    computed.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn digest_with_salt(salt: &str, password: &str, iterations: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let mut digest = hasher.finalize();
    for _ in 1..iterations {
        digest = Sha256::digest(digest);
    }
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let stored = hash_password("admin123");
        assert!(verify_password("admin123", &stored));
        assert!(!verify_password("admin124", &stored));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-secret");
        let b = hash_password("same-secret");
        assert_ne!(a, b);
    }

    #[test]
    fn stored_hash_never_contains_the_secret() {
        let stored = hash_password("hunter2-secret");
        assert!(!stored.contains("hunter2-secret"));
        assert!(stored.starts_with("sha256:"));
    }

    #[test]
    fn malformed_hashes_verify_as_false() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "plaintext"));
        assert!(!verify_password("x", "md5:10$salt$digest"));
        assert!(!verify_password("x", "sha256:not-a-number$salt$digest"));
    }
}
