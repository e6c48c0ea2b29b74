// crates/xtes-core/src/crypto.rs

use sha2::{Digest, Sha256};

/// Hash a label under a domain tag: `SHA-256(domain || 0x00 || label)`.
///
/// The separator keeps `("ab", "c")` and `("a", "bc")` from colliding.
pub fn hash_labeled(domain: &str, label: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    hasher.update([0u8]);
    hasher.update(label.as_bytes());
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}
