//! One-time code Model

use serde::{Deserialize, Serialize};

/// One-time login code matching the `otp_code` table.
///
/// Only the SHA-256 hash of the code is ever stored. A row becomes
/// ineligible when `used` is set, when `expires_at` passes, or when
/// `attempts` reaches the lockout limit — the three gates are checked
/// independently at verification time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OtpCode {
    pub id: i64,
    pub email: String,
    pub code_hash: String,
    pub attempts: i64,
    pub used: bool,
    pub expires_at: i64,
    pub created_at: i64,
}
