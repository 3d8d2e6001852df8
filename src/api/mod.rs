//! API handlers for Biblio REST endpoints

pub mod auth;
pub mod books;
pub mod borrows;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::book::SortOrder,
    models::user::{CurrentUser, Role},
    AppState,
};

/// Name of the session cookie issued on login
pub const SESSION_COOKIE: &str = "session";

/// Extractor for the authenticated user from the session cookie
pub struct AuthenticatedUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Authentication("missing session cookie".to_string()))?;

        let token = jar
            .get(SESSION_COOKIE)
            .ok_or_else(|| AppError::Authentication("missing session cookie".to_string()))?;

        let user = state.services.auth.authenticate(token.value()).await?;

        Ok(AuthenticatedUser(user))
    }
}

impl CurrentUser {
    /// Role gate: callers below `required` are rejected with `Authorization`.
    pub fn require(&self, required: Role) -> AppResult<()> {
        if self.role.allows(required) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "{} role required",
                required
            )))
        }
    }
}

/// Cursor pagination query parameters shared by listing endpoints
#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Last seen id from the previous page; 0 starts from the beginning
    #[serde(rename = "lastID", default)]
    pub last_id: i64,
    /// Page size, defaults to 10
    pub limit: Option<i64>,
    /// Sort order, `asc` or `desc` (default)
    pub ord: Option<String>,
}

impl PageQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10)
    }

    pub fn order(&self) -> AppResult<SortOrder> {
        match self.ord.as_deref() {
            Some(s) => s.parse(),
            None => Ok(SortOrder::Desc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(last_id: i64, limit: Option<i64>, ord: Option<&str>) -> PageQuery {
        PageQuery {
            last_id,
            limit,
            ord: ord.map(String::from),
        }
    }

    #[test]
    fn page_query_defaults() {
        let q = query(0, None, None);
        assert_eq!(q.limit(), 10);
        assert_eq!(q.order().unwrap(), SortOrder::Desc);
    }

    #[test]
    fn page_query_rejects_bad_order() {
        assert!(query(0, None, Some("sideways")).order().is_err());
    }
}
