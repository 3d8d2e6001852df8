//! Authentication endpoints

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{CurrentUser, Role},
};

use super::{AuthenticatedUser, SESSION_COOKIE};

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response; the session id is also set as an HttpOnly cookie
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub session_id: String,
    pub user_id: i64,
    pub expired_at: DateTime<Utc>,
    pub user_type: Role,
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Wrong username or password")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let (token, expired_at, user) = state
        .services
        .auth
        .login(&request.username, &request.password)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            session_id: token,
            user_id: user.id,
            expired_at,
            user_type: user.role,
        }),
    ))
}

/// Log out, closing the current session
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out")
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<serde_json::Value>)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.services.auth.logout(cookie.value()).await?;
    }

    let removal = Cookie::build(SESSION_COOKIE).path("/").build();

    Ok((jar.remove(removal), Json(serde_json::json!({}))))
}

/// Current session user
#[utoipa::path(
    get,
    path = "/me",
    tag = "auth",
    responses(
        (status = 200, description = "Authenticated user", body = CurrentUser),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<CurrentUser> {
    Json(user)
}
