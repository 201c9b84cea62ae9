// Password Digests
// Salted blake3 digests; never store plaintext

use uuid::Uuid;

const HASH_SCHEME: &str = "blake3";

/// Hash a password with a fresh random salt.
/// Stored format: `blake3$<salt>$<hex digest>`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}${}", HASH_SCHEME, salt, salted_digest(&salt, password))
}

/// Verify a password against a stored hash. Unknown schemes and malformed
/// hashes verify as false rather than erroring.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(salt), Some(digest)) if scheme == HASH_SCHEME => {
            match blake3::Hash::from_hex(digest) {
                // blake3::Hash equality is constant-time
                Ok(expected) => salted_hash(salt, password) == expected,
                Err(_) => false,
            }
        }
        _ => false,
    }
}

fn salted_hash(salt: &str, password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize()
}

fn salted_digest(salt: &str, password: &str) -> String {
    salted_hash(salt, password).to_hex().to_string()
}
