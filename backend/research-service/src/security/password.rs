/// Password hashing and verification using Argon2id
///
/// The input here is already the client-side SHA-256 digest of the
/// cleartext (see models::researcher::validate_hex_digest); Argon2 runs
/// over that digest, so neither the wire nor the database ever carries a
/// password that can be replayed as cleartext.
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};

use crate::error::AuthFailure;

/// Hash a wire digest for storage.
pub fn hash_password(wire_digest: &str) -> Result<String, AuthFailure> {
    let salt = SaltString::generate(rand::thread_rng());
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(wire_digest.as_bytes(), &salt)
        .map_err(|_| AuthFailure::Unexpected("Failed to hash password".to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Verify a wire digest against a stored hash.
pub fn verify_password(wire_digest: &str, stored_hash: &str) -> Result<(), AuthFailure> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AuthFailure::Unexpected("Invalid password hash format".to_string()))?;

    Argon2::default()
        .verify_password(wire_digest.as_bytes(), &parsed_hash)
        .map_err(|_| AuthFailure::IncorrectPassword)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::sha256_hex;

    #[test]
    fn test_hash_and_verify() {
        let digest = sha256_hex("correct horse battery staple");
        let hash = hash_password(&digest).unwrap();
        assert!(verify_password(&digest, &hash).is_ok());
    }

    #[test]
    fn test_wrong_digest() {
        let digest = sha256_hex("correct horse battery staple");
        let hash = hash_password(&digest).unwrap();

        let wrong = sha256_hex("incorrect horse");
        assert_eq!(
            verify_password(&wrong, &hash),
            Err(AuthFailure::IncorrectPassword)
        );
    }

    #[test]
    fn test_garbage_stored_hash() {
        let digest = sha256_hex("anything");
        assert!(matches!(
            verify_password(&digest, "not-a-phc-string"),
            Err(AuthFailure::Unexpected(_))
        ));
    }

    #[test]
    fn test_salted_hashes_differ() {
        let digest = sha256_hex("same input");
        let first = hash_password(&digest).unwrap();
        let second = hash_password(&digest).unwrap();
        assert_ne!(first, second);
    }
}
