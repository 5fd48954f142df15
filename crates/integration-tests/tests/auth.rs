//! Integration tests for accounts and sessions.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`DATABASE_URL`)
//! - The API running (cargo run -p corona-api)

use corona_integration_tests::{
    TEST_PASSWORD, TestUser, api_url, error_message, session_client, unique_email,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_signup_hides_credentials() {
    let client = session_client();
    let resp = client
        .post(api_url("/signup"))
        .json(&json!({"name": "Ada", "email": unique_email("signup"), "password": TEST_PASSWORD}))
        .send()
        .await
        .expect("Failed to sign up");

    assert_eq!(resp.status(), StatusCode::OK);
    let user: Value = resp.json().await.expect("Invalid body");
    assert_eq!(user["name"], "Ada");
    assert_eq!(user["role"], 0);
    assert!(user.get("salt").is_none());
    assert!(user.get("hashed_password").is_none());
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_signup_rejects_taken_email() {
    let user = TestUser::customer().await;

    let resp = session_client()
        .post(api_url("/signup"))
        .json(&json!({"name": "Again", "email": user.email, "password": TEST_PASSWORD}))
        .send()
        .await
        .expect("Failed to sign up");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(resp).await, "Email is taken");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_signin_wrong_password() {
    let user = TestUser::customer().await;

    let resp = session_client()
        .post(api_url("/signin"))
        .json(&json!({"email": user.email, "password": "wrong123"}))
        .send()
        .await
        .expect("Failed to sign in");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(resp).await, "Email and password do not match");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_signout_ends_session() {
    let user = TestUser::customer().await;
    let profile = api_url(&format!("/user/{}", user.id));

    let resp = user.client.get(&profile).send().await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = user
        .client
        .post(api_url("/signout"))
        .send()
        .await
        .expect("Failed to sign out");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = user.client.get(&profile).send().await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_profile_is_private() {
    let alice = TestUser::customer().await;
    let bob = TestUser::customer().await;

    let resp = bob
        .client
        .get(api_url(&format!("/user/{}", alice.id)))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_admin_reads_any_profile() {
    let customer = TestUser::customer().await;
    let admin = TestUser::admin().await;

    let resp = admin
        .client
        .get(api_url(&format!("/user/{}", customer.id)))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let user: Value = resp.json().await.expect("Invalid body");
    assert_eq!(user["email"], customer.email.as_str());
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_update_profile_and_password() {
    let user = TestUser::customer().await;

    let resp = user
        .client
        .put(api_url(&format!("/user/{}", user.id)))
        .json(&json!({"name": "Renamed", "about": "Mask collector", "password": "newpass1"}))
        .send()
        .await
        .expect("Failed to update");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("Invalid body");
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["about"], "Mask collector");

    let resp = session_client()
        .post(api_url("/signin"))
        .json(&json!({"email": user.email, "password": "newpass1"}))
        .send()
        .await
        .expect("Failed to sign in");
    assert_eq!(resp.status(), StatusCode::OK);
}
