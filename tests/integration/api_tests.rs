//! API integration tests
//!
//! These tests run against a live server with a migrated database and a
//! seeded admin account (admin/admin). Run with: cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Unique suffix so reruns do not collide on names and titles
fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, chrono::Utc::now().timestamp_micros())
}

/// Log in as the seeded admin and return a bearer token
async fn get_admin_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a fresh user and return (token, user_id)
async fn register_and_login(client: &Client, name: &str) -> (String, i64) {
    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "name": name,
            "email": format!("{}@example.com", name),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({
            "username": name,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    let user_id = body["user"]["id"].as_i64().expect("No user id in response");
    (token, user_id)
}

/// Create a book as admin and return its ID, resolved through title search
async fn create_book(client: &Client, admin_token: &str, title: &str) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(admin_token)
        .json(&json!({ "title": title }))
        .send()
        .await
        .expect("Failed to send create book request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/books/search", BASE_URL))
        .query(&[("keyword", title)])
        .send()
        .await
        .expect("Failed to send search request");
    assert_eq!(response.status(), 200);

    let books: Value = response.json().await.expect("Failed to parse search response");
    books
        .as_array()
        .and_then(|b| b.first())
        .and_then(|b| b["id"].as_i64())
        .expect("Created book not found by search")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "ADMIN");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_register_login_me_round_trip() {
    let client = Client::new();
    let name = unique("reader");

    let (token, user_id) = register_and_login(&client, &name).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["id"].as_i64(), Some(user_id));
    assert_eq!(body["name"], name.as_str());
    assert_eq!(body["email"], format!("{}@example.com", name));
    assert_eq!(body["role"], "USER");
    // The password hash must never leave the server
    assert!(body.get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_register_duplicate_name() {
    let client = Client::new();
    let name = unique("dup");

    register_and_login(&client, &name).await;

    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "name": name,
            "email": format!("{}_other@example.com", name),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_register_duplicate_email_case_variant() {
    let client = Client::new();
    let name = unique("cased");

    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "name": name,
            "email": format!("{}@Example.com", name),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    // Same address, different casing, under a fresh name
    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "name": format!("{}_b", name),
            "email": format!("{}@EXAMPLE.COM", name),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_duplicate_registrations_conflict() {
    let client = Client::new();
    let name = unique("twin");

    let mut handles = Vec::new();
    for _ in 0..2 {
        let client = client.clone();
        let name = name.clone();
        handles.push(tokio::spawn(async move {
            client
                .post(format!("{}/users", BASE_URL))
                .json(&json!({
                    "name": name,
                    "email": format!("{}@example.com", name),
                    "password": "password123"
                }))
                .send()
                .await
                .expect("Failed to send request")
                .status()
                .as_u16()
        }));
    }

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.expect("Registration task panicked"));
    }
    statuses.sort();

    // One registration wins, the other is a conflict, never a server error
    assert_eq!(statuses, vec![201, 409]);
}

#[tokio::test]
#[ignore]
async fn test_register_rejects_invalid_input() {
    let client = Client::new();

    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "name": "",
            "email": "not-an-email",
            "password": "short"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_list_books_is_public() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_get_book_invalid_and_missing_id() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books/0", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    let response = client
        .get(format!("{}/books/999999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_search_rejects_blank_keyword() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books/search", BASE_URL))
        .query(&[("keyword", "   ")])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    let response = client
        .get(format!("{}/books/search", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_popular_books() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books/popular", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.as_array().map(|b| b.len() <= 10).unwrap_or(false));
}

#[tokio::test]
#[ignore]
async fn test_create_book_requires_admin() {
    let client = Client::new();

    // No token at all
    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({ "title": "Unauthorized Book" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);

    // Regular user token
    let (token, _) = register_and_login(&client, &unique("plain")).await;
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "title": "Forbidden Book" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_delete_book() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin_token, &unique("Doomed Tome")).await;

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    // Deleting the same book again fails server-side
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 500);

    let response = client
        .delete(format!("{}/books/0", BASE_URL))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_lifecycle() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin_token, &unique("Borrowable")).await;
    let (token, user_id) = register_and_login(&client, &unique("borrower")).await;

    // Borrow the book
    let response = client
        .post(format!("{}/borrow_records", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "user_id": user_id, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    // Book is now BORROWED
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let book: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(book["status"], "BORROWED");

    // A second borrow is rejected
    let response = client
        .post(format!("{}/borrow_records", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "user_id": user_id, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // The rejected borrow left no trace: still exactly one record for the
    // book, still open, and the status is unchanged
    let response = client
        .get(format!("{}/borrow_records/books", BASE_URL))
        .bearer_auth(&token)
        .query(&[("id", book_id)])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let records: Value = response.json().await.expect("Failed to parse response");
    let records = records.as_array().expect("Expected an array");
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert!(record["returned_date"].is_null());
    let record_id = record["id"].as_i64().expect("No record id");
    assert_eq!(record["user_id"].as_i64(), Some(user_id));
    assert!(record["borrowed_date"].is_string());

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let book: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(book["status"], "BORROWED");

    // Returning against the wrong book is rejected
    let response = client
        .put(format!(
            "{}/borrow_records/{}/books/{}",
            BASE_URL,
            record_id,
            book_id + 1
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    // Return the book
    let response = client
        .put(format!(
            "{}/borrow_records/{}/books/{}",
            BASE_URL, record_id, book_id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    // Book is AVAILABLE again
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let book: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(book["status"], "AVAILABLE");

    // A second return is rejected
    let response = client
        .put(format!(
            "{}/borrow_records/{}/books/{}",
            BASE_URL, record_id, book_id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // The book can be borrowed again
    let response = client
        .post(format!("{}/borrow_records", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "user_id": user_id, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_borrow_rejects_unknown_user_and_book() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let (token, user_id) = register_and_login(&client, &unique("ghost")).await;

    let response = client
        .post(format!("{}/borrow_records", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "user_id": 999999999, "book_id": 1 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);

    let response = client
        .post(format!("{}/borrow_records", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "user_id": user_id, "book_id": 999999999 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);

    let response = client
        .post(format!("{}/borrow_records", BASE_URL))
        .bearer_auth(&admin_token)
        .json(&json!({ "user_id": user_id, "book_id": 0 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_return_unknown_record() {
    let client = Client::new();
    let (token, _) = register_and_login(&client, &unique("returner")).await;

    let response = client
        .put(format!(
            "{}/borrow_records/999999999/books/1",
            BASE_URL
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_borrow_records_require_auth() {
    let client = Client::new();

    let response = client
        .get(format!("{}/borrow_records", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);

    let response = client
        .post(format!("{}/borrow_records", BASE_URL))
        .json(&json!({ "user_id": 1, "book_id": 1 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_borrow_record_listings() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin_token, &unique("Listed")).await;
    let (token, user_id) = register_and_login(&client, &unique("lister")).await;

    let response = client
        .post(format!("{}/borrow_records", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "user_id": user_id, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/borrow_records/users", BASE_URL))
        .bearer_auth(&token)
        .query(&[("id", user_id)])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let records: Value = response.json().await.expect("Failed to parse response");
    let records = records.as_array().expect("Expected an array");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["book_id"].as_i64(), Some(book_id));

    let response = client
        .get(format!("{}/borrow_records/users", BASE_URL))
        .bearer_auth(&token)
        .query(&[("id", -1)])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    let response = client
        .get(format!("{}/borrow_records", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_have_single_winner() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin_token, &unique("Contested")).await;
    let (token, user_id) = register_and_login(&client, &unique("racer")).await;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let client = client.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            client
                .post(format!("{}/borrow_records", BASE_URL))
                .bearer_auth(&token)
                .json(&json!({ "user_id": user_id, "book_id": book_id }))
                .send()
                .await
                .expect("Failed to send request")
                .status()
        }));
    }

    let mut won = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.expect("Borrow task panicked").as_u16() {
            204 => won += 1,
            409 => rejected += 1,
            other => panic!("Unexpected status: {}", other),
        }
    }

    assert_eq!(won, 1);
    assert_eq!(rejected, 4);

    // The losers created no records: exactly one exists for the contested book
    let response = client
        .get(format!("{}/borrow_records/books", BASE_URL))
        .bearer_auth(&token)
        .query(&[("id", book_id)])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let records: Value = response.json().await.expect("Failed to parse response");
    let records = records.as_array().expect("Expected an array");
    assert_eq!(records.len(), 1);
    assert!(records[0]["returned_date"].is_null());
}
