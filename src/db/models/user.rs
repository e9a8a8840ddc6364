//! User Model

use serde::{Deserialize, Serialize};

/// User account matching the `user` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
    pub profile_image: String,
    pub is_verified: bool,
    pub notifications: bool,
    pub newsletter: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create user payload (password already hashed by the caller)
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
}

/// Public profile view — what auth endpoints return. Never carries the
/// password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub is_verified: bool,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            is_verified: user.is_verified,
        }
    }
}

impl User {
    /// Verify password using argon2
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.password_hash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_roundtrip() {
        let hash = User::hash_password("pw123456").unwrap();
        assert!(hash.starts_with("$argon2"));

        let user = User {
            id: 1,
            username: "alice".into(),
            email: "a@x.com".into(),
            password_hash: hash,
            full_name: "Alice".into(),
            phone: String::new(),
            profile_image: String::new(),
            is_verified: false,
            notifications: true,
            newsletter: false,
            created_at: 0,
            updated_at: 0,
        };

        assert!(user.verify_password("pw123456").unwrap());
        assert!(!user.verify_password("wrong-password").unwrap());
    }
}
