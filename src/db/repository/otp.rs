//! One-time code Repository
//!
//! Expiry is a property of this store: `create` purges rows already past
//! their expiry, so the table never needs an external reaper. Correctness
//! never depends on the purge — eligibility is decided per query against
//! `expires_at` and `used`.

use super::RepoResult;
use crate::db::models::OtpCode;
use crate::utils::now_millis;
use sqlx::SqlitePool;

/// Issue a new code record for an email, expiring `ttl_ms` after creation.
/// Both timestamps derive from the same clock read, so
/// `expires_at == created_at + ttl_ms` exactly.
pub async fn create(
    pool: &SqlitePool,
    email: &str,
    code_hash: &str,
    ttl_ms: i64,
) -> RepoResult<OtpCode> {
    let now = now_millis();
    let expires_at = now + ttl_ms;

    // Opportunistic TTL: drop every record whose expiry has passed.
    sqlx::query("DELETE FROM otp_code WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO otp_code (email, code_hash, expires_at, created_at) \
         VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(email)
    .bind(code_hash)
    .bind(expires_at)
    .bind(now)
    .fetch_one(pool)
    .await?;

    let code = sqlx::query_as::<_, OtpCode>(
        "SELECT id, email, code_hash, attempts, used, expires_at, created_at \
         FROM otp_code WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(code)
}

/// The only record eligible for verification: the most recently created
/// unused one for this email. Expiry is NOT filtered here — an expired
/// newest record must surface as "expired", not "no active code".
pub async fn find_latest_unused(pool: &SqlitePool, email: &str) -> RepoResult<Option<OtpCode>> {
    let code = sqlx::query_as::<_, OtpCode>(
        "SELECT id, email, code_hash, attempts, used, expires_at, created_at \
         FROM otp_code WHERE email = ? AND used = 0 \
         ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(code)
}

/// Count a failed verification attempt.
pub async fn record_attempt(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    sqlx::query("UPDATE otp_code SET attempts = attempts + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Mark a code used. The `used = 0` predicate makes consumption
/// single-shot: a second call (or a concurrent one) reports false.
pub async fn consume(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let result = sqlx::query("UPDATE otp_code SET used = 1 WHERE id = ? AND used = 0")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}
