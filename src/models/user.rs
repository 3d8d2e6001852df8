//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// User role tiers, increasing privilege in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Borrower,
    Librarian,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Borrower => "borrower",
            Role::Librarian => "librarian",
            Role::Admin => "admin",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Role::Borrower => 0,
            Role::Librarian => 1,
            Role::Admin => 2,
        }
    }

    /// Partial-order check: does this role meet the required minimum?
    pub fn allows(&self, required: Role) -> bool {
        self.rank() >= required.rank()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "borrower" => Ok(Role::Borrower),
            "librarian" => Ok(Role::Librarian),
            "admin" => Ok(Role::Admin),
            other => Err(format!("invalid role: {}", other)),
        }
    }
}

/// User model from database. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

/// Create user request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub role: Role,
}

/// Update user request. A missing password keeps the current hash.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub username: String,
    pub password: Option<String>,
    pub role: Role,
}

/// The authenticated caller resolved from a session cookie. Threaded
/// explicitly into handlers; core services only ever see plain ids.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_order_is_admin_over_librarian_over_borrower() {
        assert!(Role::Admin.allows(Role::Librarian));
        assert!(Role::Admin.allows(Role::Borrower));
        assert!(Role::Librarian.allows(Role::Borrower));
        assert!(!Role::Librarian.allows(Role::Admin));
        assert!(!Role::Borrower.allows(Role::Librarian));
    }

    #[test]
    fn every_role_allows_itself() {
        for role in [Role::Borrower, Role::Librarian, Role::Admin] {
            assert!(role.allows(role));
        }
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Borrower, Role::Librarian, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }
}
