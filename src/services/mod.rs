//! Business logic services

pub mod auth;
pub mod catalog;
pub mod fines;
pub mod issues;
pub mod stats;
pub mod users;

use crate::{
    config::{AuthConfig, PolicyConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub issues: issues::IssuesService,
    pub fines: fines::FinesService,
    pub users: users::UsersService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig, policy: PolicyConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            issues: issues::IssuesService::new(repository.clone(), policy),
            fines: fines::FinesService::new(repository.clone()),
            users: users::UsersService::new(repository.clone()),
            stats: stats::StatsService::new(repository),
        }
    }
}
