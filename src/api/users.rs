//! User management endpoints
//!
//! Beyond the role gate, the original management rules apply: only admins
//! may touch librarian or admin accounts, and librarians never see admins.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, CurrentUser, Role, UpdateUser, User},
};

use super::{AuthenticatedUser, PageQuery};

/// Only admins may manage privileged (librarian/admin) accounts.
fn require_may_manage(caller: &CurrentUser, target_role: Role) -> AppResult<()> {
    caller.require(Role::Librarian)?;
    if target_role != Role::Borrower && caller.role != Role::Admin {
        return Err(AppError::Authorization(
            "only admin can manage another admin or librarian".to_string(),
        ));
    }
    Ok(())
}

/// Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 403, description = "Not allowed to create this role"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(request): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    require_may_manage(&caller, request.role)?;

    let user = state.services.users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Replace a user's fields
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 403, description = "Not allowed to update this role"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    require_may_manage(&caller, request.role)?;
    // The target's current role is checked too, so a librarian cannot
    // demote an admin by writing a borrower role over it.
    let existing = state.services.users.get_user(id).await?;
    require_may_manage(&caller, existing.role)?;

    let user = state.services.users.update_user(id, request).await?;
    Ok(Json(user))
}

/// Remove a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User removed"),
        (status = 403, description = "Not allowed to remove this role"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let existing = state.services.users.get_user(id).await?;
    require_may_manage(&caller, existing.role)?;

    state.services.users.remove_user(id).await?;
    Ok(Json(serde_json::json!({ "id": id })))
}

/// List users with cursor pagination. Librarians do not see admins.
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of users", body = Vec<User>),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<Vec<User>>> {
    caller.require(Role::Librarian)?;

    let roles: &[Role] = if caller.role == Role::Admin {
        &[Role::Admin, Role::Librarian, Role::Borrower]
    } else {
        &[Role::Librarian, Role::Borrower]
    };

    let users = state
        .services
        .users
        .list_users(page.last_id, page.limit(), page.order()?, roles)
        .await?;
    Ok(Json(users))
}

/// Get a user by ID. Borrowers may only read their own record; admins are
/// hidden from librarians.
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    if caller.role == Role::Borrower && caller.id != id {
        return Err(AppError::Authorization(
            "borrower can't see other users".to_string(),
        ));
    }

    let user = state.services.users.get_user(id).await?;

    if caller.role == Role::Librarian && user.role == Role::Admin {
        return Err(AppError::NotFound(format!("User with id {} not found", id)));
    }

    Ok(Json(user))
}
