use sha2::{Digest, Sha256};
use uuid::Uuid;

const SCHEME: &str = "sha256";

/// Hash a shared page password as `sha256$<salt>$<hex digest>`
pub fn hash_password(plain: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    hash_with_salt(plain, &salt)
}

fn hash_with_salt(plain: &str, salt: &str) -> String {
    format!("{}${}${}", SCHEME, salt, digest_hex(plain, salt))
}

fn digest_hex(plain: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(plain.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Verify `plain` against a stored hash. Unknown formats never verify.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (scheme, salt, expected) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(salt), Some(expected)) => (scheme, salt, expected),
        _ => return false,
    };
    if scheme != SCHEME || salt.is_empty() {
        return false;
    }
    constant_time_eq(digest_hex(plain, salt).as_bytes(), expected.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
