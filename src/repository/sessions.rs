//! Sessions repository for database operations

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::session::Session};

#[derive(Clone)]
pub struct SessionsRepository {
    pool: Pool<Postgres>,
}

impl SessionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create or replace the user's session. One live session per user.
    pub async fn create(&self, user_id: i64, token: &str) -> AppResult<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, token)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET token = EXCLUDED.token, created_at = now()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    /// Look up a session by its token
    pub async fn get_by_token(&self, token: &str) -> AppResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Delete a session by its token. Idempotent.
    pub async fn delete(&self, token: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
