//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::SortOrder,
    models::user::{Role, User},
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
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by username (primary authentication lookup)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Create a user. The caller hashes the password.
    pub async fn create(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_username_conflict(e, username))
    }

    /// Full replace of a user's mutable fields
    pub async fn update(
        &self,
        id: i64,
        email: &str,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $1, username = $2, password_hash = $3, role = $4, updated_at = now()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_username_conflict(e, username))?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Delete a user by ID. Idempotent.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// List users with cursor pagination, restricted to the given roles.
    pub async fn list(
        &self,
        cursor: i64,
        limit: i64,
        order: SortOrder,
        roles: &[Role],
    ) -> AppResult<Vec<User>> {
        let role_names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();

        let users = match order {
            SortOrder::Asc if cursor > 0 => {
                sqlx::query_as::<_, User>(
                    r#"
                    SELECT * FROM users
                    WHERE id > $1 AND role = ANY($2)
                    ORDER BY id ASC LIMIT $3
                    "#,
                )
                .bind(cursor)
                .bind(&role_names)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            SortOrder::Asc => {
                sqlx::query_as::<_, User>(
                    "SELECT * FROM users WHERE role = ANY($1) ORDER BY id ASC LIMIT $2",
                )
                .bind(&role_names)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            SortOrder::Desc if cursor > 0 => {
                sqlx::query_as::<_, User>(
                    r#"
                    SELECT * FROM users
                    WHERE id < $1 AND role = ANY($2)
                    ORDER BY id DESC LIMIT $3
                    "#,
                )
                .bind(cursor)
                .bind(&role_names)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            SortOrder::Desc => {
                sqlx::query_as::<_, User>(
                    "SELECT * FROM users WHERE role = ANY($1) ORDER BY id DESC LIMIT $2",
                )
                .bind(&role_names)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(users)
    }

    fn map_username_conflict(e: sqlx::Error, username: &str) -> AppError {
        match e {
            sqlx::Error::Database(db) if db.constraint() == Some("users_username_key") => {
                AppError::Conflict(format!("Username {} already exists", username))
            }
            other => AppError::Database(other),
        }
    }
}
