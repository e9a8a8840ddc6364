//! User Repository

use super::{RepoError, RepoResult};
use crate::db::models::{User, UserCreate};
use crate::utils::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, phone, \
     profile_image, is_verified, notifications, newsletter, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM user WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM user WHERE email = ? LIMIT 1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Duplicate check for signup — matches either unique field.
pub async fn exists_by_username_or_email(
    pool: &SqlitePool,
    username: &str,
    email: &str,
) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user WHERE username = ? OR email = ?",
    )
    .bind(username)
    .bind(email)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub async fn create(pool: &SqlitePool, data: UserCreate) -> RepoResult<User> {
    let id = snowflake_id();
    let now = now_millis();

    sqlx::query(
        "INSERT INTO user (id, username, email, password_hash, full_name, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&data.username)
    .bind(&data.email)
    .bind(&data.password_hash)
    .bind(&data.full_name)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

/// Flip the verification flag after the first successful OTP redemption.
pub async fn mark_verified(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    sqlx::query("UPDATE user SET is_verified = 1, updated_at = ? WHERE id = ?")
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
