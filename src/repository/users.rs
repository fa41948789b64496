//! Users repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{User, UserQuery, UserRow},
    },
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::from)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email (login lookups)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::from);
        Ok(user)
    }

    /// List users with filters and pagination
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let role_filter: Option<i16> = query.role.map(i16::from);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::text IS NULL OR first_name ILIKE '%' || $1 || '%'
                                    OR last_name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR email ILIKE '%' || $2 || '%')
              AND ($3::smallint IS NULL OR role = $3)
            "#,
        )
        .bind(&query.name)
        .bind(&query.email)
        .bind(role_filter)
        .fetch_one(&self.pool)
        .await?;

        let users = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NULL OR first_name ILIKE '%' || $1 || '%'
                                    OR last_name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR email ILIKE '%' || $2 || '%')
              AND ($3::smallint IS NULL OR role = $3)
            ORDER BY last_name, first_name, id
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(&query.name)
        .bind(&query.email)
        .bind(role_filter)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

        Ok((users, total))
    }

    /// Create a user. The password is already hashed by the auth service.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        role: Role,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> AppResult<User> {
        let duplicate: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        if duplicate {
            return Err(AppError::Conflict(format!("Email {} is already registered", email)));
        }

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, role, phone, address, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(i16::from(role))
        .bind(phone)
        .bind(address)
        .fetch_one(&self.pool)
        .await?;

        Ok(User::from(row))
    }

    /// Update user fields; a `new_password_hash` replaces the stored hash.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: i32,
        email: Option<&str>,
        new_password_hash: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
        role: Option<Role>,
        phone: Option<&str>,
        address: Option<&str>,
        is_active: Option<bool>,
    ) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                first_name = COALESCE($4, first_name),
                last_name = COALESCE($5, last_name),
                role = COALESCE($6, role),
                phone = COALESCE($7, phone),
                address = COALESCE($8, address),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(new_password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(role.map(i16::from))
        .bind(phone)
        .bind(address)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        Ok(User::from(row))
    }

    /// Soft-delete: deactivate the account. Ledger history stays intact.
    pub async fn deactivate(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    /// Store a refresh token digest
    pub async fn store_refresh_token(
        &self,
        user_id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Consume a refresh token: single use, deleted on redemption.
    /// Returns the owning user id, or None for unknown/expired tokens.
    pub async fn consume_refresh_token(&self, token_hash: &str) -> AppResult<Option<i32>> {
        let user_id: Option<i32> = sqlx::query_scalar(
            "DELETE FROM refresh_tokens WHERE token_hash = $1 AND expires_at > NOW() RETURNING user_id",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        // Opportunistically drop expired tokens
        sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(user_id)
    }
}
