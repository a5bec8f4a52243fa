use sha2::{Digest, Sha256};

/// Deterministic salted digest. The salt is a single process-wide
/// secret (`AUTH_SALT`), not per-record, so equal passwords produce
/// equal digests. A known reuse weakness carried over from the source
/// system; strengthening the scheme changes every stored hash and must
/// be a versioned migration, not a silent fix.
pub fn hash_password(plain: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recomputes and compares. A malformed password is just a string to
/// hash; there is no error path.
pub fn verify_password(plain: &str, salt: &str, digest: &str) -> bool {
    hash_password(plain, salt) == digest
}
