//! Borrow lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::borrow::{BorrowRecord, BorrowRecordDetails},
    models::user::Role,
};

use super::{AuthenticatedUser, PageQuery};

/// Borrow request
#[derive(Deserialize, ToSchema)]
pub struct BorrowRequest {
    pub user_id: i64,
    pub book_id: i64,
}

/// (user, book) pair identifying a borrow record
#[derive(Deserialize, IntoParams)]
pub struct RecordQuery {
    pub user_id: i64,
    pub book_id: i64,
}

/// History query: librarians may scope to one user
#[derive(Deserialize, IntoParams)]
pub struct HistoryQuery {
    #[serde(rename = "lastID", default)]
    pub last_id: i64,
    pub limit: Option<i64>,
    pub user_id: Option<i64>,
}

/// Borrow a book for a user
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Borrow record created", body = BorrowRecord),
        (status = 404, description = "User or book not found"),
        (status = 409, description = "No copies available, already borrowing, or borrow limit reached"),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn create_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowRecord>)> {
    caller.require(Role::Librarian)?;

    let record = state
        .services
        .borrows
        .borrow_book(request.user_id, request.book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/borrows/{id}/return",
    tag = "borrows",
    params(("id" = i64, Path, description = "Borrow record ID")),
    responses(
        (status = 200, description = "Book returned", body = BorrowRecord),
        (status = 404, description = "Borrow record not found"),
        (status = 409, description = "Already returned"),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn return_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<BorrowRecord>> {
    caller.require(Role::Librarian)?;

    let record = state.services.borrows.return_book(id).await?;
    Ok(Json(record))
}

/// List borrow history. Borrowers always see their own; librarians see
/// everything or one user's via `user_id`.
#[utoipa::path(
    get,
    path = "/borrows",
    tag = "borrows",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Page of borrow records", body = Vec<BorrowRecordDetails>)
    )
)]
pub async fn list_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<BorrowRecordDetails>>> {
    let limit = query.limit.unwrap_or(10);

    let history = if caller.role == Role::Borrower {
        state
            .services
            .borrows
            .history_for_user(caller.id, query.last_id, limit)
            .await?
    } else {
        match query.user_id {
            Some(user_id) => {
                state
                    .services
                    .borrows
                    .history_for_user(user_id, query.last_id, limit)
                    .await?
            }
            None => state.services.borrows.history(query.last_id, limit).await?,
        }
    };

    Ok(Json(history))
}

/// The caller's own borrow history
#[utoipa::path(
    get,
    path = "/me/borrows",
    tag = "borrows",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of borrow records", body = Vec<BorrowRecordDetails>)
    )
)]
pub async fn my_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<Vec<BorrowRecordDetails>>> {
    let history = state
        .services
        .borrows
        .history_for_user(caller.id, page.last_id, page.limit())
        .await?;
    Ok(Json(history))
}

/// Active loans for a user. Borrowers may only see their own.
#[utoipa::path(
    get,
    path = "/users/{id}/borrows",
    tag = "borrows",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Active loans", body = Vec<BorrowRecordDetails>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_active_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<BorrowRecordDetails>>> {
    if caller.role == Role::Borrower && caller.id != user_id {
        return Err(crate::error::AppError::Authorization(
            "borrower can't see other users' loans".to_string(),
        ));
    }

    let loans = state.services.borrows.active_loans(user_id).await?;
    Ok(Json(loans))
}

/// Most recent borrow record for a (user, book) pair
#[utoipa::path(
    get,
    path = "/borrows/record",
    tag = "borrows",
    params(RecordQuery),
    responses(
        (status = 200, description = "Borrow record", body = BorrowRecord),
        (status = 404, description = "No record for this pair"),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn get_record(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<RecordQuery>,
) -> AppResult<Json<BorrowRecord>> {
    caller.require(Role::Librarian)?;

    let record = state
        .services
        .borrows
        .get_record(query.user_id, query.book_id)
        .await?;
    Ok(Json(record))
}

/// Number of books a user currently has on loan
#[utoipa::path(
    get,
    path = "/users/{id}/borrows/count",
    tag = "borrows",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Active borrow count"),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn count_active(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    caller.require(Role::Librarian)?;

    let count = state.services.borrows.count_active(user_id).await?;
    Ok(Json(serde_json::json!({ "count": count })))
}
