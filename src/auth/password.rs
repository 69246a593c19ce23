//! Password digests for both credential generations.
//!
//! Two formats coexist in the `users` table: the legacy unsalted MD5 digest
//! carried over from the old system, and the current salted SHA-256 digest.
//! Which one applies is recorded per row in `hash_algo`; legacy rows are
//! rewritten to the current format on their next successful login.

use md5::Md5;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Salt stored on rows imported from the old system, which had none.
pub const LEGACY_SALT: &str = "LEGACY";

/// Hex length of an MD5 digest; used when inferring the format of untagged rows.
const LEGACY_DIGEST_LEN: usize = 32;

/// Salt byte length before hex encoding.
const SALT_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha256,
}

impl HashAlgorithm {
    /// Recover the algorithm from the credential's shape.
    ///
    /// Only needed for rows imported without a `hash_algo` tag: a 32-hex
    /// digest paired with the sentinel salt is legacy, everything else is
    /// current.
    pub fn infer(digest: &str, salt: &str) -> Self {
        if digest.len() == LEGACY_DIGEST_LEN && salt == LEGACY_SALT {
            HashAlgorithm::Md5
        } else {
            HashAlgorithm::Sha256
        }
    }
}

/// Current algorithm: hex SHA-256 over salt followed by password.
pub fn hash(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Legacy algorithm: hex MD5, no salt. Verification only; never used for
/// new credentials.
pub fn legacy_hash(password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fresh per-user salt, hex-encoded.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Check a password against a stored credential under its tagged algorithm.
pub fn verify(password: &str, digest: &str, salt: &str, algorithm: HashAlgorithm) -> bool {
    let computed = match algorithm {
        HashAlgorithm::Md5 => legacy_hash(password),
        HashAlgorithm::Sha256 => hash(password, salt),
    };
    constant_time_eq(computed.as_bytes(), digest.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_hash_matches_reference_value() {
        assert_eq!(
            legacy_hash("password"),
            "5f4dcc3b5aa765d61d8327deb882cf99"
        );
    }

    #[test]
    fn hash_is_deterministic_per_salt() {
        let salt = generate_salt();
        assert_eq!(hash("secret", &salt), hash("secret", &salt));
        assert_ne!(hash("secret", &salt), hash("secret", &generate_salt()));
    }

    #[test]
    fn generated_salts_are_fresh_and_fixed_length() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(a.len(), SALT_BYTES * 2);
        assert_ne!(a, b);
        assert_ne!(a, LEGACY_SALT);
    }

    #[test]
    fn verify_roundtrip_current_algorithm() {
        let salt = generate_salt();
        let digest = hash("Secur3P@ssw0rd!", &salt);
        assert!(verify("Secur3P@ssw0rd!", &digest, &salt, HashAlgorithm::Sha256));
        assert!(!verify("wrong-password", &digest, &salt, HashAlgorithm::Sha256));
    }

    #[test]
    fn verify_roundtrip_legacy_algorithm() {
        let digest = legacy_hash("password");
        assert!(verify("password", &digest, LEGACY_SALT, HashAlgorithm::Md5));
        assert!(!verify("Password", &digest, LEGACY_SALT, HashAlgorithm::Md5));
    }

    #[test]
    fn infer_detects_legacy_shape_only() {
        let legacy = legacy_hash("password");
        assert_eq!(HashAlgorithm::infer(&legacy, LEGACY_SALT), HashAlgorithm::Md5);

        // Same digest length but a real salt is not legacy.
        assert_eq!(
            HashAlgorithm::infer(&legacy, &generate_salt()),
            HashAlgorithm::Sha256
        );

        let salt = generate_salt();
        let current = hash("password", &salt);
        assert_eq!(HashAlgorithm::infer(&current, &salt), HashAlgorithm::Sha256);
    }
}
