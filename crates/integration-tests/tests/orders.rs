//! Integration tests for checkout and order management.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`DATABASE_URL`)
//! - The API running (cargo run -p corona-api)

use corona_core::OrderStatus;
use corona_integration_tests::{TestUser, api_url, error_message, session_client, unique_name};
use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

async fn product_counts(id: &Value) -> (i64, i64) {
    let product: Value = session_client()
        .get(api_url(&format!("/product/{id}")))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    (
        product["quantity"].as_i64().expect("Missing quantity"),
        product["sold"].as_i64().expect("Missing sold"),
    )
}

fn new_transaction_id() -> String {
    format!("txn_{}", Uuid::new_v4().simple())
}

fn order_with_lines(lines: &[(&Value, i32)], transaction_id: &str) -> Value {
    let products: Vec<Value> = lines
        .iter()
        .map(|(id, count)| json!({"_id": id, "count": count}))
        .collect();
    json!({
        "order": {
            "products": products,
            "transaction_id": transaction_id,
            "amount": "20.00",
            "address": "1 Main St"
        }
    })
}

fn order_body(product_id: &Value, count: i32) -> Value {
    order_with_lines(&[(product_id, count)], &new_transaction_id())
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_order_requires_signin() {
    let resp = session_client()
        .post(api_url("/order/create"))
        .json(&order_body(&json!(1), 1))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_checkout_updates_stock_and_history() {
    let admin = TestUser::admin().await;
    let category = admin.create_category(&unique_name("Masks")).await;
    let product = admin
        .create_product(&unique_name("Mask"), category, "10", 5)
        .await;

    let buyer = TestUser::customer().await;
    let resp = buyer
        .client
        .post(api_url("/order/create"))
        .json(&order_body(&product["id"], 2))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let order: Value = resp.json().await.expect("Invalid body");
    assert_eq!(order["status"], "Not processed");
    assert_eq!(order["products"][0]["count"], 2);

    assert_eq!(product_counts(&product["id"]).await, (3, 2));

    let user: Value = buyer
        .client
        .get(api_url(&format!("/user/{}", buyer.id)))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert_eq!(user["history"].as_array().map(Vec::len), Some(1));

    let orders: Vec<Value> = buyer
        .client
        .get(api_url(&format!("/orders/by/user/{}", buyer.id)))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], order["id"]);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_checkout_short_stock_changes_nothing() {
    let admin = TestUser::admin().await;
    let category = admin.create_category(&unique_name("Gloves")).await;
    let product = admin
        .create_product(&unique_name("Glove"), category, "4", 1)
        .await;

    let buyer = TestUser::customer().await;
    let resp = buyer
        .client
        .post(api_url("/order/create"))
        .json(&order_body(&product["id"], 3))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(resp).await, "Could not update product");

    assert_eq!(product_counts(&product["id"]).await, (1, 0));
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_checkout_is_all_or_nothing_across_lines() {
    let admin = TestUser::admin().await;
    let category = admin.create_category(&unique_name("Bundles")).await;
    let plenty = admin
        .create_product(&unique_name("Plenty"), category, "3", 5)
        .await;
    let scarce = admin
        .create_product(&unique_name("Scarce"), category, "7", 1)
        .await;

    let buyer = TestUser::customer().await;
    let body = order_with_lines(
        &[(&plenty["id"], 2), (&scarce["id"], 3)],
        &new_transaction_id(),
    );
    let resp = buyer
        .client
        .post(api_url("/order/create"))
        .json(&body)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(resp).await, "Could not update product");

    // The line with enough stock is rolled back too
    assert_eq!(product_counts(&plenty["id"]).await, (5, 0));
    assert_eq!(product_counts(&scarce["id"]).await, (1, 0));

    let orders: Vec<Value> = buyer
        .client
        .get(api_url(&format!("/orders/by/user/{}", buyer.id)))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert!(orders.is_empty());
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_reused_transaction_id_decrements_once() {
    let admin = TestUser::admin().await;
    let category = admin.create_category(&unique_name("Retries")).await;
    let product = admin
        .create_product(&unique_name("Retry"), category, "5", 10)
        .await;

    let buyer = TestUser::customer().await;
    let body = order_with_lines(&[(&product["id"], 2)], &new_transaction_id());

    let resp = buyer
        .client
        .post(api_url("/order/create"))
        .json(&body)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(product_counts(&product["id"]).await, (8, 2));

    let resp = buyer
        .client
        .post(api_url("/order/create"))
        .json(&body)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(product_counts(&product["id"]).await, (8, 2));

    let user: Value = buyer
        .client
        .get(api_url(&format!("/user/{}", buyer.id)))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert_eq!(user["history"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_admin_updates_order_status() {
    let admin = TestUser::admin().await;
    let category = admin.create_category(&unique_name("Visors")).await;
    let product = admin
        .create_product(&unique_name("Visor"), category, "8", 4)
        .await;

    let buyer = TestUser::customer().await;
    let order: Value = buyer
        .client
        .post(api_url("/order/create"))
        .json(&order_body(&product["id"], 1))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    let order_id = &order["id"];

    let statuses: Vec<String> = admin
        .client
        .get(api_url("/order/status-values"))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert_eq!(statuses.len(), OrderStatus::ALL.len());

    let resp = buyer
        .client
        .put(api_url(&format!("/order/{order_id}/status")))
        .json(&json!({"status": OrderStatus::Shipped}))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = admin
        .client
        .put(api_url(&format!("/order/{order_id}/status")))
        .json(&json!({"status": OrderStatus::Shipped}))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("Invalid body");
    assert_eq!(updated["status"], "Shipped");

    let all: Vec<Value> = admin
        .client
        .get(api_url("/order/list"))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert!(all.iter().any(|o| &o["id"] == order_id));
}
