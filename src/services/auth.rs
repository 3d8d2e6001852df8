//! Authentication and session service

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CurrentUser, User},
    repository::Repository,
    services::users::UsersService,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    users: UsersService,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, users: UsersService, config: AuthConfig) -> Self {
        Self {
            repository,
            users,
            config,
        }
    }

    /// Verify credentials and open a session. Replaces any previous session
    /// for the same user.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> AppResult<(String, DateTime<Utc>, User)> {
        let user = self.users.verify_credentials(username, password).await?;

        let token = Uuid::new_v4().to_string();
        let session = self.repository.sessions.create(user.id, &token).await?;
        let expires_at =
            session.created_at + chrono::Duration::seconds(self.config.session_ttl_seconds as i64);

        Ok((token, expires_at, user))
    }

    /// Close the session for a token. Idempotent.
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.repository.sessions.delete(token).await
    }

    /// Resolve a session token into the authenticated caller, rejecting
    /// unknown and expired sessions.
    pub async fn authenticate(&self, token: &str) -> AppResult<CurrentUser> {
        let session = self
            .repository
            .sessions
            .get_by_token(token)
            .await?
            .ok_or_else(|| AppError::Authentication("session expired".to_string()))?;

        if session.is_expired(self.config.session_ttl_seconds, Utc::now()) {
            self.repository.sessions.delete(token).await?;
            return Err(AppError::Authentication("session expired".to_string()));
        }

        let user = self.repository.users.get_by_id(session.user_id).await?;

        Ok(CurrentUser {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        })
    }
}
