use sha2::{Digest, Sha256};

/// SHA-256 hex fingerprint.
///
/// Issued tokens are stored and looked up only by this fingerprint, so a
/// leaked table never yields a usable token.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_distinct_inputs_distinct_fingerprints() {
        assert_ne!(sha256_hex("token-a"), sha256_hex("token-b"));
    }
}
