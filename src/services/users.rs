//! User administration service

use crate::{
    error::AppResult,
    models::{
        enums::Role,
        user::{CreateUser, UpdateUser, User, UserQuery},
    },
    repository::Repository,
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List users with filters
    pub async fn search_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.search(query).await
    }

    /// Get user by ID
    pub async fn get_user(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create a user (admin operation; role may be elevated)
    pub async fn create_user(&self, request: &CreateUser) -> AppResult<User> {
        let password_hash = hash_password(&request.password)?;
        self.repository
            .users
            .create(
                &request.email,
                &password_hash,
                &request.first_name,
                &request.last_name,
                request.role.unwrap_or(Role::User),
                request.phone.as_deref(),
                request.address.as_deref(),
            )
            .await
    }

    /// Update a user (admin operation)
    pub async fn update_user(&self, id: i32, request: &UpdateUser) -> AppResult<User> {
        let password_hash = match &request.password {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };
        self.repository
            .users
            .update(
                id,
                request.email.as_deref(),
                password_hash.as_deref(),
                request.first_name.as_deref(),
                request.last_name.as_deref(),
                request.role,
                request.phone.as_deref(),
                request.address.as_deref(),
                request.is_active,
            )
            .await
    }

    /// Deactivate a user account
    pub async fn deactivate_user(&self, id: i32) -> AppResult<()> {
        self.repository.users.deactivate(id).await
    }
}
