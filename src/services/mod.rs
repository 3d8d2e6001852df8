//! Business logic services

pub mod auth;
pub mod borrows;
pub mod catalog;
pub mod users;

use crate::{
    config::{AuthConfig, BorrowingConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub users: users::UsersService,
    pub borrows: borrows::BorrowsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        borrowing_config: BorrowingConfig,
    ) -> Self {
        let users = users::UsersService::new(repository.clone());
        Self {
            auth: auth::AuthService::new(repository.clone(), users.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            borrows: borrows::BorrowsService::new(repository, borrowing_config),
            users,
        }
    }
}
