pub mod config;
pub mod content;
pub mod dates;
pub mod entities;
pub mod error;
pub mod feed;
pub mod language;
pub mod models;
pub mod page_cache;
pub mod revalidate;
pub mod reviews;
pub mod routes;
pub mod sitemap;
pub mod slug;
pub mod store;
pub mod templates;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use crate::{config::Config, routes::AppState, store::Store};
use crate::routes::{api, pages};

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/reviews", get(pages::reviews_index))
        .route("/reviews/{slug}", get(pages::review))
        .route("/feed.xml", get(pages::feed_xml))
        .route("/sitemap.xml", get(pages::sitemap_xml))
        .route("/api/movies", get(api::list_movies).post(api::create_movie))
        .route("/api/reviews", get(api::list_reviews).post(api::create_review))
        .route(
            "/api/reviews/{id}",
            get(api::get_review).put(api::update_review).delete(api::delete_review),
        )
        .route("/api/revalidate", get(api::revalidation_audit).post(api::revalidate))
        .route("/api/admin/migrate-languages", post(api::migrate_languages))
        .fallback(pages::not_found)
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
