//! Integration tests for categories and products.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`DATABASE_URL`)
//! - The API running (cargo run -p corona-api)

use corona_integration_tests::{TestUser, api_url, error_message, session_client, unique_name};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_customer_cannot_create_category() {
    let user = TestUser::customer().await;

    let resp = user
        .client
        .post(api_url("/category/create"))
        .json(&json!({"name": unique_name("Masks")}))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_message(resp).await, "Admin resource! Access denied");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_category_lifecycle() {
    let admin = TestUser::admin().await;
    let name = unique_name("Gloves");
    let id = admin.create_category(&name).await;
    let url = api_url(&format!("/category/{id}"));

    let category: Value = session_client()
        .get(&url)
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert_eq!(category["name"], name.as_str());

    let renamed = unique_name("Nitrile");
    let resp = admin
        .client
        .put(&url)
        .json(&json!({"name": renamed}))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = admin.client.delete(&url).send().await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = session_client().get(&url).send().await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(resp).await, "Category not found");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_product_create_read_and_photo() {
    let admin = TestUser::admin().await;
    let category = admin.create_category(&unique_name("Masks")).await;
    let product = admin
        .create_product(&unique_name("N95"), category, "12.50", 10)
        .await;
    let id = product["id"].as_i64().expect("Missing product id");

    assert_eq!(product["category"]["id"], category);
    assert_eq!(product["sold"], 0);
    assert_eq!(product["has_photo"], false);

    let resp = session_client()
        .get(api_url(&format!("/product/{id}")))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = session_client()
        .get(api_url(&format!("/product/photo/{id}")))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_product_create_requires_all_fields() {
    let admin = TestUser::admin().await;
    let form = reqwest::multipart::Form::new().text("name", "Incomplete");

    let resp = admin
        .client
        .post(api_url("/product/create"))
        .multipart(form)
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(resp).await, "All fields are required");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_filtered_search_by_category_and_price() {
    let admin = TestUser::admin().await;
    let category = admin.create_category(&unique_name("Sanitizer")).await;
    admin
        .create_product(&unique_name("Gel"), category, "5", 3)
        .await;
    admin
        .create_product(&unique_name("Spray"), category, "25", 3)
        .await;

    let resp = session_client()
        .post(api_url("/products/by/search"))
        .json(&json!({
            "filters": {"category": [category], "price": [0, 9]},
            "limit": 10,
            "skip": 0
        }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let page: Value = resp.json().await.expect("Invalid body");
    assert_eq!(page["size"], 1);
    assert_eq!(page["data"][0]["category"]["id"], category);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_name_search_within_category() {
    let admin = TestUser::admin().await;
    let category = admin.create_category(&unique_name("Shields")).await;
    let name = unique_name("Visor");
    admin.create_product(&name, category, "15", 2).await;

    let mut url = reqwest::Url::parse(&api_url("/products/search")).expect("Invalid URL");
    url.query_pairs_mut()
        .append_pair("search", &name.to_lowercase())
        .append_pair("category", &category.to_string());

    let products: Vec<Value> = session_client()
        .get(url)
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");

    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], name.as_str());
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_unknown_sort_field_rejected() {
    let resp = session_client()
        .get(api_url("/products?sortBy=photo"))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_related_excludes_product() {
    let admin = TestUser::admin().await;
    let category = admin.create_category(&unique_name("Kits")).await;
    let first = admin
        .create_product(&unique_name("Kit A"), category, "30", 1)
        .await;
    let second = admin
        .create_product(&unique_name("Kit B"), category, "31", 1)
        .await;
    let id = first["id"].as_i64().expect("Missing product id");

    let related: Vec<Value> = session_client()
        .get(api_url(&format!("/products/related/{id}")))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");

    assert!(related.iter().all(|p| p["id"] != first["id"]));
    assert!(related.iter().any(|p| p["id"] == second["id"]));

    // Sorting keys have no meaning here and are ignored
    let resp = session_client()
        .get(api_url(&format!("/products/related/{id}?sortBy=photo&order=sideways")))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_used_categories_skip_empty_ones() {
    let admin = TestUser::admin().await;
    let used = admin.create_category(&unique_name("Used")).await;
    let empty = admin.create_category(&unique_name("Empty")).await;
    admin
        .create_product(&unique_name("Stocked"), used, "2", 1)
        .await;

    let ids: Vec<i64> = session_client()
        .get(api_url("/products/categories"))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");

    assert!(ids.contains(&used));
    assert!(!ids.contains(&empty));
}
