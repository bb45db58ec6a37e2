use axum::routing::get;
use axum::Router;
use std::sync::Arc;

use crate::api::handlers;
use crate::store::Store;

/// Builds the application router. The store is injected as shared state so
/// tests can run the same routes against an in-memory backend.
pub fn create_router<S: Store + 'static>() -> Router<Arc<S>> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route(
            "/api/categories",
            get(handlers::list_categories::<S>)
                .post(handlers::create_category::<S>)
                .delete(handlers::delete_categories::<S>),
        )
        .route(
            "/api/categories/:id",
            get(handlers::get_category::<S>)
                .put(handlers::update_category::<S>)
                .delete(handlers::delete_category::<S>),
        )
        .route(
            "/api/taxonomies",
            get(handlers::list_taxonomies::<S>)
                .post(handlers::create_taxonomy::<S>)
                .delete(handlers::delete_taxonomies::<S>),
        )
        .route(
            "/api/taxonomies/:id",
            get(handlers::get_taxonomy::<S>)
                .put(handlers::update_taxonomy::<S>)
                .delete(handlers::delete_taxonomy::<S>),
        )
        .route(
            "/api/varieties",
            get(handlers::list_varieties::<S>)
                .post(handlers::create_variety::<S>)
                .delete(handlers::delete_varieties::<S>),
        )
        .route(
            "/api/varieties/:id",
            get(handlers::get_variety::<S>)
                .put(handlers::update_variety::<S>)
                .delete(handlers::delete_variety::<S>),
        )
}
