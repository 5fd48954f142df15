//! Integration tests for Corona Shop.
//!
//! These tests drive a running API over HTTP and reach into its database
//! only to promote test accounts to admin.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! cargo run -p corona-cli -- migrate
//!
//! # Start the API (port 8000)
//! cargo run -p corona-api
//!
//! # Run the ignored tests
//! cargo test -p corona-integration-tests -- --ignored
//! ```
//!
//! `CORONA_TEST_API_URL` overrides the API address and `DATABASE_URL`
//! points at the API's database.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::{Client, StatusCode, multipart};
use serde_json::{Value, json};
use uuid::Uuid;

/// Password used for every test account.
pub const TEST_PASSWORD: &str = "secret123";

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("CORONA_TEST_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_owned())
}

/// Full URL of an `/api` path.
#[must_use]
pub fn api_url(path: &str) -> String {
    format!("{}/api{path}", api_base_url())
}

/// A unique address so tests don't collide across runs.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

/// A unique display name of at most 32 characters.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("{prefix} {suffix}")
}

/// A client that keeps the session cookie.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A signed-in account.
pub struct TestUser {
    pub client: Client,
    pub id: i64,
    pub email: String,
}

impl TestUser {
    /// Sign up a fresh customer and sign in.
    pub async fn customer() -> Self {
        let client = session_client();
        let email = unique_email("customer");

        let resp = client
            .post(api_url("/signup"))
            .json(&json!({"name": "Test Customer", "email": email, "password": TEST_PASSWORD}))
            .send()
            .await
            .expect("Failed to sign up");
        assert_eq!(resp.status(), StatusCode::OK, "signup failed");
        let user: Value = resp.json().await.expect("Invalid signup body");
        let id = user["id"].as_i64().expect("Missing user id");

        let user = Self { client, id, email };
        user.signin().await;
        user
    }

    /// Sign up a fresh account, promote it to admin and sign in.
    pub async fn admin() -> Self {
        let user = Self::customer().await;
        promote_to_admin(user.id).await;
        // Sign in again so the session carries the new role
        user.signin().await;
        user
    }

    async fn signin(&self) {
        let resp = self
            .client
            .post(api_url("/signin"))
            .json(&json!({"email": self.email, "password": TEST_PASSWORD}))
            .send()
            .await
            .expect("Failed to sign in");
        assert_eq!(resp.status(), StatusCode::OK, "signin failed");
    }

    /// Create a category and return its id.
    pub async fn create_category(&self, name: &str) -> i64 {
        let resp = self
            .client
            .post(api_url("/category/create"))
            .json(&json!({"name": name}))
            .send()
            .await
            .expect("Failed to create category");
        assert_eq!(resp.status(), StatusCode::OK, "category create failed");
        let category: Value = resp.json().await.expect("Invalid category body");
        category["id"].as_i64().expect("Missing category id")
    }

    /// Create a product without a photo and return it.
    pub async fn create_product(&self, name: &str, category: i64, price: &str, quantity: i32) -> Value {
        let form = multipart::Form::new()
            .text("name", name.to_owned())
            .text("description", "Integration test product")
            .text("price", price.to_owned())
            .text("category", category.to_string())
            .text("quantity", quantity.to_string())
            .text("shipping", "true");

        let resp = self
            .client
            .post(api_url("/product/create"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to create product");
        assert_eq!(resp.status(), StatusCode::OK, "product create failed");
        resp.json().await.expect("Invalid product body")
    }
}

/// Give an account the admin role directly in the database.
pub async fn promote_to_admin(user_id: i64) {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::query(r#"UPDATE shop."user" SET role = 1 WHERE id = $1"#)
        .bind(i32::try_from(user_id).expect("User id out of range"))
        .execute(&pool)
        .await
        .expect("Failed to promote user");

    pool.close().await;
}

/// The `error` field of an error response.
pub async fn error_message(resp: reqwest::Response) -> String {
    let body: Value = resp.json().await.expect("Invalid error body");
    body["error"].as_str().unwrap_or_default().to_owned()
}
