//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, User, UserClaims},
    repository::Repository,
};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new user with a hashed password
    pub async fn register(&self, user: &CreateUser) -> AppResult<User> {
        if self.repository.users.name_exists(&user.name).await? {
            return Err(AppError::Conflict(format!(
                "User name '{}' is already taken",
                user.name
            )));
        }
        if self.repository.users.email_exists(&user.email).await? {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }

        let password_hash = hash_password(&user.password)?;
        let created = self
            .repository
            .users
            .create(&user.name, &user.email, &password_hash)
            .await
            .map_err(|e| {
                // A concurrent duplicate passes the pre-checks and lands on
                // the unique indexes instead
                if e.is_unique_violation() {
                    AppError::Conflict(format!(
                        "User name '{}' or email '{}' is already registered",
                        user.name, user.email
                    ))
                } else {
                    e
                }
            })?;
        tracing::info!(user_id = created.id, name = %created.name, "User registered");
        Ok(created)
    }

    /// Authenticate a user by name and return a JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_name(username)
            .await?
            .ok_or_else(|| {
                AppError::Authentication("Invalid username or password".to_string())
            })?;

        if !verify_password(&user.password, password)? {
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);
        let claims = UserClaims {
            sub: user.name.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!(user_id = user.id, name = %user.name, "User authenticated");
        Ok((token, user))
    }

    /// Get user by ID
    pub async fn find_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }
}
