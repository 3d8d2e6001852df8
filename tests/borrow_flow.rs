//! Borrow lifecycle tests against a live Postgres database.
//!
//! Run with: cargo test -- --ignored (requires DATABASE_URL)

use sqlx::PgPool;

use biblio_server::{
    config::BorrowingConfig,
    error::AppError,
    models::book::{NewBook, SortOrder},
    repository::Repository,
    services::borrows::BorrowsService,
};

async fn seed_user(pool: &PgPool, username: &str) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO users (email, username, password_hash, role)
        VALUES ($1, $2, 'not-a-real-hash', 'borrower')
        RETURNING id
        "#,
    )
    .bind(format!("{}@example.com", username))
    .bind(username)
    .fetch_one(pool)
    .await
    .expect("failed to seed user")
}

async fn seed_book(pool: &PgPool, title: &str, copies: i64) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO books (title, author, category, cover, available_count)
        VALUES ($1, 'Test Author', 'fiction', '', $2)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(copies)
    .fetch_one(pool)
    .await
    .expect("failed to seed book")
}

async fn available_count(pool: &PgPool, book_id: i64) -> i64 {
    sqlx::query_scalar("SELECT available_count FROM books WHERE id = $1")
        .bind(book_id)
        .fetch_one(pool)
        .await
        .expect("failed to read available_count")
}

async fn active_records(pool: &PgPool, book_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM borrow_history WHERE book_id = $1 AND returned_at IS NULL",
    )
    .bind(book_id)
    .fetch_one(pool)
    .await
    .expect("failed to count active records")
}

fn service(pool: &PgPool, max_books_per_user: Option<u32>) -> BorrowsService {
    BorrowsService::new(
        Repository::new(pool.clone()),
        BorrowingConfig { max_books_per_user },
    )
}

#[sqlx::test]
#[ignore]
async fn borrow_then_return_round_trip(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let book = seed_book(&pool, "Round Trip", 3).await;
    let svc = service(&pool, None);

    let record = svc.borrow_book(user, book).await.expect("borrow failed");
    assert!(record.is_active());
    assert_eq!(available_count(&pool, book).await, 2);

    let returned = svc.return_book(record.id).await.expect("return failed");
    assert_eq!(returned.id, record.id);
    assert!(returned.returned_at.is_some());
    assert_eq!(available_count(&pool, book).await, 3);

    // Exactly one record for the pair, stamped.
    let records: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM borrow_history WHERE user_id = $1 AND book_id = $2",
    )
    .bind(user)
    .bind(book)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(records, 1);
    assert_eq!(active_records(&pool, book).await, 0);
}

#[sqlx::test]
#[ignore]
async fn last_copy_has_a_single_winner(pool: PgPool) {
    let u1 = seed_user(&pool, "bob").await;
    let u2 = seed_user(&pool, "carol").await;
    let book = seed_book(&pool, "Last Copy", 1).await;
    let svc = service(&pool, None);

    let (r1, r2) = tokio::join!(svc.borrow_book(u1, book), svc.borrow_book(u2, book));

    let successes = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of two concurrent borrows must win");

    let loser = if r1.is_err() { r1 } else { r2 };
    assert!(matches!(loser, Err(AppError::BookUnavailable(_))));

    assert_eq!(available_count(&pool, book).await, 0);
    assert_eq!(active_records(&pool, book).await, 1);
}

#[sqlx::test]
#[ignore]
async fn duplicate_borrow_of_same_book_is_rejected(pool: PgPool) {
    let user = seed_user(&pool, "dave").await;
    let book = seed_book(&pool, "Duplicate", 5).await;
    let svc = service(&pool, None);

    svc.borrow_book(user, book).await.expect("first borrow failed");
    let err = svc.borrow_book(user, book).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyBorrowing { .. }));

    // The failed attempt must not have touched the count.
    assert_eq!(available_count(&pool, book).await, 4);
}

#[sqlx::test]
#[ignore]
async fn double_return_is_rejected_without_double_increment(pool: PgPool) {
    let user = seed_user(&pool, "erin").await;
    let book = seed_book(&pool, "Double Return", 1).await;
    let svc = service(&pool, None);

    let record = svc.borrow_book(user, book).await.unwrap();
    svc.return_book(record.id).await.expect("first return failed");

    let err = svc.return_book(record.id).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyReturned(_)));
    assert_eq!(available_count(&pool, book).await, 1);
}

#[sqlx::test]
#[ignore]
async fn borrow_limit_is_enforced(pool: PgPool) {
    let user = seed_user(&pool, "frank").await;
    let b1 = seed_book(&pool, "Limit 1", 1).await;
    let b2 = seed_book(&pool, "Limit 2", 1).await;
    let b3 = seed_book(&pool, "Limit 3", 1).await;
    let svc = service(&pool, Some(2));

    svc.borrow_book(user, b1).await.unwrap();
    svc.borrow_book(user, b2).await.unwrap();

    // Third borrow fails regardless of that book's own availability.
    let err = svc.borrow_book(user, b3).await.unwrap_err();
    assert!(matches!(err, AppError::BorrowLimitReached { limit: 2, .. }));
    assert_eq!(available_count(&pool, b3).await, 1);

    // Returning one frees a slot.
    let record = svc.get_record(user, b1).await.unwrap();
    svc.return_book(record.id).await.unwrap();
    svc.borrow_book(user, b3).await.expect("borrow after return failed");
}

#[sqlx::test]
#[ignore]
async fn unavailable_book_recovers_after_return(pool: PgPool) {
    let u1 = seed_user(&pool, "gina").await;
    let u2 = seed_user(&pool, "hugo").await;
    let book = seed_book(&pool, "Scenario", 1).await;
    let svc = service(&pool, None);

    let r1 = svc.borrow_book(u1, book).await.expect("first borrow failed");
    assert_eq!(available_count(&pool, book).await, 0);
    assert!(r1.is_active());

    let err = svc.borrow_book(u2, book).await.unwrap_err();
    assert!(matches!(err, AppError::BookUnavailable(_)));
    assert_eq!(available_count(&pool, book).await, 0);

    let returned = svc.return_book(r1.id).await.expect("return failed");
    assert!(returned.returned_at.is_some());
    assert_eq!(available_count(&pool, book).await, 1);

    svc.borrow_book(u2, book).await.expect("borrow after return failed");
    assert_eq!(available_count(&pool, book).await, 0);
}

#[sqlx::test]
#[ignore]
async fn failed_borrow_leaves_state_untouched(pool: PgPool) {
    let user = seed_user(&pool, "iris").await;
    let book = seed_book(&pool, "Empty Shelf", 0).await;
    let svc = service(&pool, None);

    let err = svc.borrow_book(user, book).await.unwrap_err();
    assert!(matches!(err, AppError::BookUnavailable(_)));

    assert_eq!(available_count(&pool, book).await, 0);
    let records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrow_history WHERE book_id = $1")
        .bind(book)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(records, 0);
}

#[sqlx::test]
#[ignore]
async fn borrowing_missing_book_is_not_found(pool: PgPool) {
    let user = seed_user(&pool, "jack").await;
    let svc = service(&pool, None);

    let err = svc.borrow_book(user, 999_999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test]
#[ignore]
async fn returning_missing_record_is_not_found(pool: PgPool) {
    let svc = service(&pool, None);

    let err = svc.return_book(999_999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test]
#[ignore]
async fn copies_are_conserved_across_borrow_return_sequences(pool: PgPool) {
    let users = [
        seed_user(&pool, "kate").await,
        seed_user(&pool, "liam").await,
        seed_user(&pool, "mona").await,
    ];
    let book = seed_book(&pool, "Conservation", 3).await;
    let svc = service(&pool, None);

    let check = |pool: PgPool| async move {
        available_count(&pool, book).await + active_records(&pool, book).await
    };

    let r0 = svc.borrow_book(users[0], book).await.unwrap();
    assert_eq!(check(pool.clone()).await, 3);

    svc.borrow_book(users[1], book).await.unwrap();
    assert_eq!(check(pool.clone()).await, 3);

    svc.return_book(r0.id).await.unwrap();
    assert_eq!(check(pool.clone()).await, 3);

    svc.borrow_book(users[2], book).await.unwrap();
    svc.borrow_book(users[0], book).await.unwrap();
    assert_eq!(check(pool.clone()).await, 3);

    // All copies out; the count can never go below zero.
    let err = svc.borrow_book(users[1], book).await.unwrap_err();
    assert!(matches!(err, AppError::BookUnavailable(_)));
    assert_eq!(available_count(&pool, book).await, 0);
}

#[sqlx::test]
#[ignore]
async fn active_loans_projection_tracks_returns(pool: PgPool) {
    let user = seed_user(&pool, "nina").await;
    let b1 = seed_book(&pool, "Active 1", 1).await;
    let b2 = seed_book(&pool, "Active 2", 1).await;
    let svc = service(&pool, None);

    let r1 = svc.borrow_book(user, b1).await.unwrap();
    svc.borrow_book(user, b2).await.unwrap();

    let active = svc.active_loans(user).await.unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|l| l.returned_at.is_none()));
    assert_eq!(svc.count_active(user).await.unwrap(), 2);

    svc.return_book(r1.id).await.unwrap();

    let active = svc.active_loans(user).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].book_id, b2);
    assert_eq!(svc.count_active(user).await.unwrap(), 1);
}

#[sqlx::test]
#[ignore]
async fn cursor_pagination_walks_books_in_order(pool: PgPool) {
    let repository = Repository::new(pool.clone());
    for i in 0..5 {
        repository
            .books
            .create(&NewBook {
                title: format!("Paged {}", i),
                author: String::new(),
                category: String::new(),
                cover: String::new(),
                available_count: 1,
            })
            .await
            .unwrap();
    }

    let first = repository.books.list(0, 2, SortOrder::Asc).await.unwrap();
    assert_eq!(first.len(), 2);
    assert!(first[0].id < first[1].id);

    let cursor = first.last().unwrap().id;
    let second = repository.books.list(cursor, 2, SortOrder::Asc).await.unwrap();
    assert_eq!(second.len(), 2);
    assert!(second.iter().all(|b| b.id > cursor));

    let newest = repository.books.list(0, 1, SortOrder::Desc).await.unwrap();
    assert_eq!(newest.len(), 1);
    assert!(newest[0].id > second[1].id);
}

#[sqlx::test]
#[ignore]
async fn updating_missing_book_is_not_found(pool: PgPool) {
    let repository = Repository::new(pool.clone());

    let err = repository
        .books
        .update(
            424_242,
            &biblio_server::models::book::BookUpdate {
                title: "Ghost".to_string(),
                author: String::new(),
                category: String::new(),
                cover: String::new(),
                available_count: 1,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
