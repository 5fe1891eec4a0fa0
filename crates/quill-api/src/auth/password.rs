//! PBKDF2-HMAC-SHA256 password hashing.
//!
//! Hashes are stored as `{iterations}:{saltHex}:{hashHex}` so the work factor can be
//! raised later without invalidating existing accounts.

use pbkdf2::pbkdf2_hmac;
use quill_core::constants::{PASSWORD_KEY_BYTES, PASSWORD_SALT_BYTES};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Longest derived key accepted from a stored hash.
const MAX_STORED_KEY_BYTES: usize = 64;

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let iterations = iterations.max(1);
    let mut salt = [0u8; PASSWORD_SALT_BYTES];
    rand::rng().fill_bytes(&mut salt);

    let mut key = [0u8; PASSWORD_KEY_BYTES];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut key);

    format!("{}:{}:{}", iterations, hex::encode(salt), hex::encode(key))
}

struct StoredHash {
    iterations: u32,
    salt: Vec<u8>,
    key: Vec<u8>,
}

fn parse_stored(stored: &str) -> Option<StoredHash> {
    let mut parts = stored.split(':');
    let (iterations, salt, key) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let iterations: u32 = iterations.parse().ok()?;
    if iterations == 0 {
        return None;
    }
    let salt = hex::decode(salt).ok()?;
    let key = hex::decode(key).ok()?;
    if salt.is_empty() || key.is_empty() || key.len() > MAX_STORED_KEY_BYTES {
        return None;
    }

    Some(StoredHash {
        iterations,
        salt,
        key,
    })
}

/// Check `password` against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some(stored) = parse_stored(stored) else {
        return false;
    };

    let mut derived = vec![0u8; stored.key.len()];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        &stored.salt,
        stored.iterations,
        &mut derived,
    );

    derived.ct_eq(&stored.key).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITERATIONS: u32 = 1_000;

    #[test]
    fn test_round_trip() {
        let stored = hash_password("correct horse battery staple", ITERATIONS);
        assert!(verify_password("correct horse battery staple", &stored));
        assert!(!verify_password("correct horse battery stapler", &stored));
    }

    #[test]
    fn test_format() {
        let stored = hash_password("pw", ITERATIONS);
        let parts: Vec<&str> = stored.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "1000");
        assert_eq!(parts[1].len(), PASSWORD_SALT_BYTES * 2);
        assert_eq!(parts[2].len(), PASSWORD_KEY_BYTES * 2);
    }

    #[test]
    fn test_salted_hashes_differ() {
        let a = hash_password("same password", ITERATIONS);
        let b = hash_password("same password", ITERATIONS);
        assert_ne!(a, b);
        assert!(verify_password("same password", &a));
        assert!(verify_password("same password", &b));
    }

    #[test]
    fn test_malformed_hashes_never_verify() {
        let valid = hash_password("pw", ITERATIONS);
        let (_, rest) = valid.split_once(':').unwrap();

        let malformed = [
            String::new(),
            "garbage".to_string(),
            "1000:abcd".to_string(),
            format!("{}:extra", valid),
            format!("0:{}", rest),
            format!("-5:{}", rest),
            format!("many:{}", rest),
            "1000:zz:00ff".to_string(),
            "1000::00ff".to_string(),
            "1000:00ff:".to_string(),
            format!("1000:00ff:{}", "ab".repeat(MAX_STORED_KEY_BYTES + 1)),
        ];
        for stored in &malformed {
            assert!(!verify_password("pw", stored), "accepted {:?}", stored);
        }
    }

    #[test]
    fn test_embedded_iteration_count_is_used() {
        let stored = hash_password("pw", 2_000);
        assert!(stored.starts_with("2000:"));
        assert!(verify_password("pw", &stored));
    }
}
