//! User management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::SortOrder,
    models::user::{CreateUser, Role, UpdateUser, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a user with a hashed password
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        user.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let password_hash = self.hash_password(&user.password)?;
        self.repository
            .users
            .create(&user.email, &user.username, &password_hash, user.role)
            .await
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Replace a user's fields. A missing password keeps the current hash.
    pub async fn update_user(&self, id: i64, user: UpdateUser) -> AppResult<User> {
        user.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let password_hash = match &user.password {
            Some(password) => self.hash_password(password)?,
            None => self.repository.users.get_by_id(id).await?.password_hash,
        };

        self.repository
            .users
            .update(id, &user.email, &user.username, &password_hash, user.role)
            .await
    }

    /// Remove a user. Idempotent.
    pub async fn remove_user(&self, id: i64) -> AppResult<()> {
        self.repository.users.delete(id).await
    }

    /// List users with cursor pagination, restricted to the given roles
    pub async fn list_users(
        &self,
        cursor: i64,
        limit: i64,
        order: SortOrder,
        roles: &[Role],
    ) -> AppResult<Vec<User>> {
        self.repository.users.list(cursor, limit, order, roles).await
    }

    /// Check a username/password pair, returning the user on success.
    /// Failures are indistinguishable between unknown user and bad password.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("wrong username or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication(
                "wrong username or password".to_string(),
            ));
        }

        Ok(user)
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| AppError::Internal(format!("invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
