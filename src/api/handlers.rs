use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::api::envelope::{
    conflict, invalid_input, not_found, translate_store_error, ApiReply, Envelope, ErrorReply,
};
use crate::logic::{
    build_query_options, compile_include, parse_query, scalar_param, validate_body, validate_id,
    validate_query_params, BodySchema, IncludeSpec, QueryOptions, QuerySchema, LENIENT_QUERY,
    STRICT_QUERY,
};
use crate::model::{
    Category, NewCategory, NewTaxonomy, NewVariety, Taxonomy, Variety, VarietyPatch,
    CREATE_CATEGORY_SCHEMA, CREATE_TAXONOMY_SCHEMA, CREATE_VARIETY_SCHEMA, UPDATE_VARIETY_SCHEMA,
};
use crate::store::{Store, StoreError};

pub type AppState<S> = Arc<S>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn root() -> Html<&'static str> {
    Html(
        "<h1>Plantarium API</h1>\
         <p>A REST API for plant categories, taxonomies and varieties.</p>\
         <p>Resources live under <code>/api/categories</code>, \
         <code>/api/taxonomies</code> and <code>/api/varieties</code>.</p>",
    )
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Parses and validates the query string of a list request, returning the
/// normalized options and compiled include tree.
fn parse_list_query(
    raw_query: Option<&str>,
    schema: &QuerySchema,
    invalid_message: &str,
) -> Result<(QueryOptions, IncludeSpec), ErrorReply> {
    let params = parse_query(raw_query.unwrap_or(""), false);
    validate_query_params(schema, &params)
        .map_err(|rejection| invalid_input(invalid_message, &rejection))?;

    let filters = scalar_param(&params, "filter")
        .map(|value| parse_query(value, false))
        .unwrap_or_default();
    let sort = scalar_param(&params, "sort")
        .map(|value| parse_query(value, false))
        .unwrap_or_default();
    let include = scalar_param(&params, "include")
        .map(compile_include)
        .unwrap_or_default();

    Ok((build_query_options(&filters, &sort), include))
}

/// Read-by-id requests honor `include` only, but still reject malformed
/// query parameters.
fn parse_read_query(
    raw_query: Option<&str>,
    schema: &QuerySchema,
    invalid_message: &str,
) -> Result<IncludeSpec, ErrorReply> {
    let (_, include) = parse_list_query(raw_query, schema, invalid_message)?;
    Ok(include)
}

fn parse_id(raw: &str, invalid_message: &str) -> Result<i64, ErrorReply> {
    validate_id(raw).map_err(|rejection| invalid_input(invalid_message, &rejection))
}

fn parse_body<T: serde::de::DeserializeOwned>(
    schema: &BodySchema,
    body: &Value,
) -> Result<T, ErrorReply> {
    validate_body(schema, body).map_err(|rejection| invalid_input("Invalid input", &rejection))
}

fn ok<T: Serialize>(message: &str, data: T) -> ApiReply<T> {
    Ok((StatusCode::OK, Json(Envelope::success_with(message, data))))
}

fn created<T: Serialize>(message: &str, data: T) -> ApiReply<T> {
    Ok((
        StatusCode::CREATED,
        Json(Envelope::success_with(message, data)),
    ))
}

fn ok_empty(message: &str) -> ApiReply<()> {
    Ok((StatusCode::OK, Json(Envelope::success(message))))
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub async fn list_categories<S: Store>(
    State(store): State<AppState<S>>,
    RawQuery(query): RawQuery,
) -> ApiReply<Vec<Category>> {
    let (options, include) = parse_list_query(
        query.as_deref(),
        &STRICT_QUERY,
        "Invalid category query parameters",
    )?;
    let categories = store
        .find_categories(&options, &include)
        .await
        .map_err(translate_store_error)?;
    if categories.is_empty() {
        return Err(not_found("Categories not found"));
    }
    ok("Categories retrieved successfully", categories)
}

pub async fn get_category<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiReply<Category> {
    let id = parse_id(&id, "Invalid category ID")?;
    let include = parse_read_query(
        query.as_deref(),
        &STRICT_QUERY,
        "Invalid category query parameters",
    )?;
    let category = store
        .find_category(id, &include)
        .await
        .map_err(translate_store_error)?
        .ok_or_else(|| not_found("Category not found!"))?;
    ok("Category retrieved successfully", category)
}

pub async fn create_category<S: Store>(
    State(store): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiReply<Category> {
    let data: NewCategory = parse_body(&CREATE_CATEGORY_SCHEMA, &body)?;
    let category = store.create_category(data).await.map_err(|err| match err {
        StoreError::UniqueViolation(_) => conflict("Category already exists!"),
        other => translate_store_error(other),
    })?;
    created("Category created successfully", category)
}

pub async fn update_category<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiReply<Category> {
    let id = parse_id(&id, "Invalid category ID")?;
    let data: NewCategory = parse_body(&CREATE_CATEGORY_SCHEMA, &body)?;
    let category = store
        .update_category(id, data)
        .await
        .map_err(|err| match err {
            StoreError::NotFound => not_found("Category not found!"),
            StoreError::UniqueViolation(_) => {
                conflict("A category with the same name already exists!")
            }
            other => translate_store_error(other),
        })?;
    ok("Category updated successfully", category)
}

pub async fn delete_category<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiReply<()> {
    let id = parse_id(&id, "Invalid category ID")?;
    store.delete_category(id).await.map_err(|err| match err {
        StoreError::NotFound => not_found("Category not found!"),
        other => translate_store_error(other),
    })?;
    ok_empty("Category deleted successfully")
}

pub async fn delete_categories<S: Store>(State(store): State<AppState<S>>) -> ApiReply<()> {
    store
        .delete_categories()
        .await
        .map_err(translate_store_error)?;
    ok_empty("Categories deleted successfully")
}

// ---------------------------------------------------------------------------
// Taxonomies
// ---------------------------------------------------------------------------

pub async fn list_taxonomies<S: Store>(
    State(store): State<AppState<S>>,
    RawQuery(query): RawQuery,
) -> ApiReply<Vec<Taxonomy>> {
    let (options, include) = parse_list_query(
        query.as_deref(),
        &LENIENT_QUERY,
        "Invalid taxonomy query parameters",
    )?;
    let taxonomies = store
        .find_taxonomies(&options, &include)
        .await
        .map_err(translate_store_error)?;
    if taxonomies.is_empty() {
        return Err(not_found("Taxonomies not found"));
    }
    ok("Taxonomies retrieved successfully", taxonomies)
}

pub async fn get_taxonomy<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiReply<Taxonomy> {
    let id = parse_id(&id, "Invalid taxonomy ID")?;
    let include = parse_read_query(
        query.as_deref(),
        &LENIENT_QUERY,
        "Invalid taxonomy query parameters",
    )?;
    let taxonomy = store
        .find_taxonomy(id, &include)
        .await
        .map_err(translate_store_error)?
        .ok_or_else(|| not_found("Taxonomy not found!"))?;
    ok("Taxonomy retrieved successfully", taxonomy)
}

pub async fn create_taxonomy<S: Store>(
    State(store): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiReply<Taxonomy> {
    let data: NewTaxonomy = parse_body(&CREATE_TAXONOMY_SCHEMA, &body)?;
    let taxonomy = store.create_taxonomy(data).await.map_err(|err| match err {
        StoreError::UniqueViolation(_) => {
            conflict("Taxonomy with this combination already exists")
        }
        other => translate_store_error(other),
    })?;
    created("Taxonomy created successfully", taxonomy)
}

pub async fn update_taxonomy<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiReply<Taxonomy> {
    let id = parse_id(&id, "Invalid taxonomy ID")?;
    let data: NewTaxonomy = parse_body(&CREATE_TAXONOMY_SCHEMA, &body)?;
    let taxonomy = store
        .update_taxonomy(id, data)
        .await
        .map_err(|err| match err {
            StoreError::NotFound => not_found("Taxonomy not found!"),
            StoreError::UniqueViolation(_) => {
                conflict("Another taxonomy with the same combination already exists!")
            }
            other => translate_store_error(other),
        })?;
    ok("Taxonomy updated successfully", taxonomy)
}

pub async fn delete_taxonomy<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiReply<()> {
    let id = parse_id(&id, "Invalid taxonomy ID")?;
    store.delete_taxonomy(id).await.map_err(|err| match err {
        StoreError::NotFound => not_found("Taxonomy not found!"),
        other => translate_store_error(other),
    })?;
    ok_empty("Taxonomy deleted successfully")
}

pub async fn delete_taxonomies<S: Store>(State(store): State<AppState<S>>) -> ApiReply<()> {
    store
        .delete_taxonomies()
        .await
        .map_err(translate_store_error)?;
    ok_empty("All taxonomies deleted successfully")
}

// ---------------------------------------------------------------------------
// Varieties
// ---------------------------------------------------------------------------

pub async fn list_varieties<S: Store>(
    State(store): State<AppState<S>>,
    RawQuery(query): RawQuery,
) -> ApiReply<Vec<Variety>> {
    let (options, include) = parse_list_query(
        query.as_deref(),
        &LENIENT_QUERY,
        "Invalid variety query parameters",
    )?;
    let varieties = store
        .find_varieties(&options, &include)
        .await
        .map_err(translate_store_error)?;
    if varieties.is_empty() {
        return Err(not_found("Varieties not found"));
    }
    ok("Varieties retrieved successfully", varieties)
}

pub async fn get_variety<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiReply<Variety> {
    let id = parse_id(&id, "Invalid variety ID")?;
    let include = parse_read_query(
        query.as_deref(),
        &LENIENT_QUERY,
        "Invalid variety query parameters",
    )?;
    let variety = store
        .find_variety(id, &include)
        .await
        .map_err(translate_store_error)?
        .ok_or_else(|| not_found("Variety not found"))?;
    ok("Variety retrieved successfully", variety)
}

pub async fn create_variety<S: Store>(
    State(store): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiReply<Variety> {
    let data: NewVariety = parse_body(&CREATE_VARIETY_SCHEMA, &body)?;
    let variety = store.create_variety(data).await.map_err(|err| match err {
        StoreError::UniqueViolation(_) => conflict("Variety already exists"),
        other => translate_store_error(other),
    })?;
    created("Variety created successfully", variety)
}

pub async fn update_variety<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiReply<Variety> {
    let id = parse_id(&id, "Invalid variety ID")?;
    let data: VarietyPatch = parse_body(&UPDATE_VARIETY_SCHEMA, &body)?;
    let variety = store
        .update_variety(id, data)
        .await
        .map_err(|err| match err {
            StoreError::NotFound => not_found("Variety not found!"),
            StoreError::UniqueViolation(_) => {
                conflict("A variety with the same name already exists!")
            }
            other => translate_store_error(other),
        })?;
    ok("Variety updated successfully", variety)
}

pub async fn delete_variety<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiReply<()> {
    let id = parse_id(&id, "Invalid variety ID")?;
    store.delete_variety(id).await.map_err(|err| match err {
        StoreError::NotFound => not_found("Variety not found!"),
        other => translate_store_error(other),
    })?;
    ok_empty("Variety deleted successfully")
}

pub async fn delete_varieties<S: Store>(State(store): State<AppState<S>>) -> ApiReply<()> {
    store
        .delete_varieties()
        .await
        .map_err(translate_store_error)?;
    ok_empty("Varieties deleted successfully")
}
