//! Authentication service: login, registration, token refresh
//!
//! Access tokens are short-lived JWTs; refresh tokens are opaque random
//! values stored server-side as SHA-256 digests and rotated on every
//! redemption, so a stolen refresh token is single-use.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{RegisterRequest, TokenResponse, User, UserClaims},
    },
    repository::Repository,
};

/// Hash a password with a fresh salt (argon2id defaults)
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by email/password and issue a token pair
    pub async fn login(&self, email: &str, password: &str) -> AppResult<TokenResponse> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !verify_password(password, &user.password_hash) {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }
        if !user.is_active {
            return Err(AppError::Authentication("Account is deactivated".to_string()));
        }

        self.issue_tokens(user).await
    }

    /// Self-registration; new accounts always get the reader role.
    pub async fn register(&self, request: &RegisterRequest) -> AppResult<TokenResponse> {
        let password_hash = hash_password(&request.password)?;
        let user = self
            .repository
            .users
            .create(
                &request.email,
                &password_hash,
                &request.first_name,
                &request.last_name,
                Role::User,
                request.phone.as_deref(),
                request.address.as_deref(),
            )
            .await?;

        tracing::info!(user_id = user.id, "new user registered");
        self.issue_tokens(user).await
    }

    /// Redeem a refresh token for a fresh token pair (rotation)
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenResponse> {
        let user_id = self
            .repository
            .users
            .consume_refresh_token(&digest(refresh_token))
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid or expired refresh token".to_string()))?;

        let user = self.repository.users.get_by_id(user_id).await?;
        if !user.is_active {
            return Err(AppError::Authentication("Account is deactivated".to_string()));
        }

        self.issue_tokens(user).await
    }

    /// Current user profile for authenticated requests
    pub async fn me(&self, user_id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(user_id).await
    }

    async fn issue_tokens(&self, user: User) -> AppResult<TokenResponse> {
        let now = Utc::now();
        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.config.access_token_minutes)).timestamp(),
        };

        let access_token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Token creation failed: {}", e)))?;

        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let refresh_token = hex::encode(bytes);

        self.repository
            .users
            .store_refresh_token(
                user.id,
                &digest(&refresh_token),
                now + Duration::days(self.config.refresh_token_days),
            )
            .await?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            user,
        })
    }
}
