use sha2::{Digest, Sha256};

/// Hash a one-time code bound to the challenge that issued it.
///
/// The challenge id acts as a salt, so the same six digits issued twice
/// never produce the same stored value.
pub fn hash_otp_code(challenge_id: &uuid::Uuid, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(challenge_id.as_bytes());
    hasher.update(b":");
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_hash_is_deterministic() {
        let id = Uuid::now_v7();
        assert_eq!(hash_otp_code(&id, "123456"), hash_otp_code(&id, "123456"));
    }

    #[test]
    fn test_hash_depends_on_challenge() {
        let a = hash_otp_code(&Uuid::now_v7(), "123456");
        let b = hash_otp_code(&Uuid::now_v7(), "123456");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_format() {
        let hash = hash_otp_code(&Uuid::now_v7(), "000000");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
