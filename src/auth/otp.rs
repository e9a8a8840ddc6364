//! One-time code primitives
//!
//! 6 位数字验证码：只存 SHA-256 哈希，5 分钟过期，5 次失败后锁定。

use sha2::{Digest, Sha256};

/// Code lifetime (milliseconds)
pub const OTP_TTL_MS: i64 = 5 * 60 * 1000;

/// Failed attempts allowed before the record locks out
pub const OTP_MAX_ATTEMPTS: i64 = 5;

/// Generate a 6-digit numeric code (100000..=999999).
pub fn generate_code() -> String {
    use rand::Rng;
    let n: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    n.to_string()
}

/// Deterministic SHA-256 hex digest of a code. The plaintext code is never
/// persisted or logged.
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}
