//! Authentication Handlers
//!
//! Signup, password login (first factor) and OTP verification (second
//! factor). A successful verification is the only way to obtain a token.

use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::api::AppJson;
use crate::auth::CurrentUser;
use crate::auth::otp::{OTP_MAX_ATTEMPTS, OTP_TTL_MS, generate_code, hash_code};
use crate::core::ServerState;
use crate::db::models::{UserCreate, UserPublic};
use crate::db::repository::{otp, user};
use crate::utils::validation::{
    MAX_USERNAME_LEN, validate_email, validate_password, validate_required_text,
};
use crate::utils::{AppError, AppResult, now_millis};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 200;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub ok: bool,
    pub user: UserPublic,
}

/// POST /api/auth/signup - 注册
pub async fn signup(
    State(state): State<ServerState>,
    AppJson(req): AppJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();

    validate_required_text(&username, "username", MAX_USERNAME_LEN)?;
    validate_email(&email)?;
    validate_password(&req.password)?;

    // Uniform conflict message regardless of which field collided.
    if user::exists_by_username_or_email(&state.pool, &username, &email).await? {
        return Err(AppError::conflict("Email or username already in use"));
    }

    let password_hash = crate::db::models::User::hash_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

    let full_name = req
        .full_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| username.clone());

    let created = user::create(
        &state.pool,
        UserCreate {
            username,
            email,
            password_hash,
            full_name,
        },
    )
    .await?;

    tracing::info!(user_id = %created.id, username = %created.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            ok: true,
            user: UserPublic::from(&created),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub ok: bool,
    pub message: String,
}

/// POST /api/auth/login - 密码校验，通过后签发验证码
///
/// 未知邮箱与密码错误返回完全相同的 401 (统一消息 + 固定延迟)，
/// 防止通过响应差异枚举注册邮箱。
pub async fn login(
    State(state): State<ServerState>,
    AppJson(req): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("email and password are required"));
    }

    let found = user::find_by_email(&state.pool, &email).await?;

    // Fixed delay before the result is acted on, so both failure paths
    // take the same time.
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    let account = match found {
        Some(account) => {
            let password_valid = account
                .verify_password(&req.password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;
            if !password_valid {
                tracing::warn!(email = %email, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }
            account
        }
        None => {
            tracing::warn!(email = %email, "Login failed - unknown email");
            return Err(AppError::invalid_credentials());
        }
    };

    // Password verified: issue a single-use code.
    let code = generate_code();
    otp::create(&state.pool, &account.email, &hash_code(&code), OTP_TTL_MS).await?;

    // Synchronous in the request path; a slow relay delays the response.
    state
        .mailer
        .send_login_code(&account.email, &code)
        .await
        .map_err(|e| AppError::internal(format!("Failed to send login code: {e}")))?;

    tracing::info!(user_id = %account.id, "Login code issued");

    Ok(Json(LoginResponse {
        ok: true,
        message: "Verification code sent to email".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub ok: bool,
    pub token: String,
    pub user: UserPublic,
}

/// POST /api/auth/verify-otp - 校验验证码，签发令牌
///
/// 校验顺序固定：存在性 → 过期 → 次数锁定 → 哈希比对。
/// 过期和锁定路径不改动任何状态。
pub async fn verify_otp(
    State(state): State<ServerState>,
    AppJson(req): AppJson<VerifyOtpRequest>,
) -> AppResult<Json<VerifyOtpResponse>> {
    let email = req.email.trim().to_lowercase();
    let code = req.code.trim();
    if email.is_empty() || code.is_empty() {
        return Err(AppError::validation("email and code are required"));
    }

    let record = otp::find_latest_unused(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::validation("No active code for this email"))?;

    if now_millis() >= record.expires_at {
        return Err(AppError::validation("Verification code expired"));
    }

    if record.attempts >= OTP_MAX_ATTEMPTS {
        tracing::warn!(email = %email, "Verification locked out - too many attempts");
        return Err(AppError::TooManyAttempts);
    }

    if hash_code(code) != record.code_hash {
        otp::record_attempt(&state.pool, record.id).await?;
        tracing::warn!(email = %email, attempts = record.attempts + 1, "Invalid code");
        return Err(AppError::InvalidCode);
    }

    // Guarded consume: a used record can never succeed again, even under
    // concurrent verification of the same code.
    if !otp::consume(&state.pool, record.id).await? {
        return Err(AppError::InvalidCode);
    }

    let account = user::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::validation("User not found"))?;

    if !account.is_verified {
        user::mark_verified(&state.pool, account.id).await?;
    }

    let token = state
        .jwt_service
        .generate_token(account.id, &account.username, &account.email)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    tracing::info!(user_id = %account.id, username = %account.username, "User logged in");

    let mut public = UserPublic::from(&account);
    public.is_verified = true;

    Ok(Json(VerifyOtpResponse {
        ok: true,
        token,
        user: public,
    }))
}

/// GET /api/auth/me - 当前用户信息
pub async fn me(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<UserPublic>> {
    let account = user::find_by_id(&state.pool, current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(UserPublic::from(&account)))
}
