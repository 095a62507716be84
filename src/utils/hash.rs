use sha2::{Digest, Sha256};

/// SHA-256 of an in-memory buffer as lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}
