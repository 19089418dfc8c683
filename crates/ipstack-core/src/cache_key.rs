use sha2::{Digest, Sha256};

/// Cache key for a client IP: `sha256(ip)` as 64 lowercase hex characters.
///
/// The raw IP string is hashed without normalisation, so `::1` and
/// `0:0:0:0:0:0:0:1` map to different keys.
pub fn cache_key(ip: &str) -> String {
    hex::encode(Sha256::digest(ip.as_bytes()))
}
