use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use plantarium::api::routes::create_router;
use plantarium::seed;
use plantarium::store::MemoryStore;

async fn test_app() -> Router {
    let store = MemoryStore::new();
    seed::load_seed_data(&store)
        .await
        .expect("seeding the in-memory store should succeed");
    create_router().with_state(Arc::new(store))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn list_categories_filters_sorts_and_includes() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/categories?filter=name=herb&sort=name=asc&include=varieties",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Categories retrieved successfully");

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], "Herb");

    let varieties = data[0]["varieties"].as_array().unwrap();
    assert!(varieties.iter().any(|v| v["name"] == "Basil"));
}

#[tokio::test]
async fn list_categories_sorts_descending() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/categories?sort=name=desc", None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    let mut sorted = names.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(names, sorted);
}

#[tokio::test]
async fn malformed_category_filter_is_rejected_with_details() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/categories?filter=name", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Invalid category query parameters");
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("Path: filter"));
    assert!(details.contains("Must be in key=value format"));
}

#[tokio::test]
async fn lenient_resources_accept_plain_query_strings() {
    let app = test_app().await;
    // A lenient filter with no value carries no predicate and matches all.
    let (status, body) = send(&app, Method::GET, "/api/varieties?filter=whatever", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().len() > 1);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/varieties?filter=name=basil",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn get_category_by_id_validates_the_id() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/categories/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid category ID");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("Expected number, received nan"));

    let (status, body) = send(&app, Method::GET, "/api/categories/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Herb");
}

#[tokio::test]
async fn bad_id_wins_over_bad_query_parameters() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/categories/abc?filter=name",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid category ID");
}

#[tokio::test]
async fn unknown_sort_field_is_a_server_error_even_with_no_rows() {
    let app = test_app().await;

    let (status, _) = send(&app, Method::DELETE, "/api/varieties", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/varieties?sort=bogus=asc", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "A database error occurred.");
}

#[tokio::test]
async fn missing_records_return_404_with_entity_messages() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/categories/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Category not found!");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/taxonomies/999",
        Some(json!({
            "kingdom": "Plantae",
            "phylum": "Tracheophyta",
            "class": "Magnoliopsida",
            "order": "Rosales",
            "family": "Rosaceae"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Taxonomy not found!");
}

#[tokio::test]
async fn creating_a_category_returns_201_and_persists() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/categories",
        Some(json!({"name": "Moss", "description": "Small non-vascular plants."})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Category created successfully");
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::GET, &format!("/api/categories/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Moss");
}

#[tokio::test]
async fn duplicate_category_names_conflict() {
    let app = test_app().await;

    let (_, before) = send(&app, Method::GET, "/api/categories", None).await;
    let count = before["data"].as_array().unwrap().len();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/categories",
        Some(json!({"name": "Herb"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Category already exists!");

    let (_, after) = send(&app, Method::GET, "/api/categories", None).await;
    assert_eq!(after["data"].as_array().unwrap().len(), count);
}

#[tokio::test]
async fn renaming_a_category_onto_an_existing_name_conflicts() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/categories/2",
        Some(json!({"name": "Herb"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "A category with the same name already exists!"
    );
}

#[tokio::test]
async fn invalid_bodies_are_rejected_with_field_paths() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/categories",
        Some(json!({"name": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid input");
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("Path: name, Error: Name is required"));
    assert!(details.contains("Current value:"));
}

#[tokio::test]
async fn variety_creation_requires_an_existing_taxonomy() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/varieties",
        Some(json!({
            "name": "Ghost Orchid",
            "scientificName": "Dendrophylax lindenii",
            "origin": "Florida and Cuba",
            "genus": "Dendrophylax",
            "species": "lindenii",
            "taxonomyId": 999
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "Foreign key constraint failed. Ensure the related record exists."
    );
}

#[tokio::test]
async fn variety_update_is_partial() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/varieties/1",
        Some(json!({"origin": "Cultivated worldwide"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Variety updated successfully");
    assert_eq!(body["data"]["origin"], "Cultivated worldwide");
    assert_eq!(body["data"]["name"], "Basil");
    assert_eq!(body["data"]["scientificName"], "Ocimum basilicum");
}

#[tokio::test]
async fn nested_includes_resolve_through_relations() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/varieties/1?include=taxonomy,categories",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["taxonomy"]["family"], "Lamiaceae");
    let categories = body["data"]["categories"].as_array().unwrap();
    assert!(categories.iter().any(|c| c["name"] == "Herb"));

    // Relations that were not asked for stay off the wire entirely.
    let (_, body) = send(&app, Method::GET, "/api/varieties/1", None).await;
    assert!(body["data"].get("taxonomy").is_none());
    assert!(body["data"].get("categories").is_none());
}

#[tokio::test]
async fn deleting_a_referenced_taxonomy_is_restricted() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::DELETE, "/api/taxonomies/1", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "Foreign key constraint failed. Ensure the related record exists."
    );
}

#[tokio::test]
async fn collection_delete_empties_the_resource() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::DELETE, "/api/varieties", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Varieties deleted successfully");
    assert!(body.get("data").is_none());

    let (status, body) = send(&app, Method::GET, "/api/varieties", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Varieties not found");
}

#[tokio::test]
async fn delete_then_get_returns_entity_not_found() {
    let app = test_app().await;

    let (status, _) = send(&app, Method::DELETE, "/api/varieties/1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/varieties/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Variety not found");

    let (status, body) = send(&app, Method::DELETE, "/api/varieties/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Variety not found!");
}

#[tokio::test]
async fn taxonomy_rank_uniqueness_is_enforced() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/taxonomies",
        Some(json!({
            "kingdom": "Plantae",
            "phylum": "Tracheophyta",
            "class": "Magnoliopsida",
            "order": "Lamiales",
            "family": "Lamiaceae"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Taxonomy with this combination already exists");
}
