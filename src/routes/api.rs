use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::{AppState, JSON, cached_response, listing_key};
use crate::{
    error::{AppError, AppResult},
    models::{ListQuery, NewMovie, Review, ReviewInput},
    page_cache::{CachePolicy, CachedPage, Lookup},
    revalidate::{AuditEntry, CacheTag, Invalidation},
    reviews::ReviewKey,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    limit: Option<String>,
    skip: Option<String>,
    sort: Option<String>,
    order: Option<String>,
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> AppResult<Response> {
    let query = ListQuery::parse(
        params.limit.as_deref(),
        params.skip.as_deref(),
        params.sort.as_deref(),
        params.order.as_deref(),
    )?;

    let (page, lookup) = state
        .cache
        .get_or_render(
            &listing_key("/api/movies", &query),
            vec![CacheTag::Movies.to_string()],
            JSON,
            CachePolicy::LISTING,
            async { to_json(&state.store.movies().list(&query).await?) },
        )
        .await?;

    Ok(cached_response(page, lookup, CachePolicy::LISTING))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewMovie>,
) -> AppResult<Response> {
    let movie = state.store.movies().insert(new).await?;
    invalidate(&state, Invalidation::Tag(CacheTag::Movie(movie.slug.clone()))).await;
    Ok((StatusCode::CREATED, Json(movie)).into_response())
}

pub async fn list_reviews(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let (page, lookup) = state
        .cache
        .get_or_render(
            "/api/reviews",
            vec![CacheTag::Reviews.to_string()],
            JSON,
            CachePolicy::REVIEWS,
            async { to_json(&state.store.reviews().all().await?) },
        )
        .await?;

    Ok(cached_response(page, lookup, CachePolicy::REVIEWS))
}

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ReviewInput>,
) -> AppResult<Response> {
    let review = state.store.reviews().create(input).await?;
    invalidate(&state, Invalidation::Tag(CacheTag::Reviews)).await;
    Ok((StatusCode::CREATED, Json(review)).into_response())
}

pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let key = format!("/api/reviews/{id}");
    let policy = CachePolicy::REVIEW;
    if let Some(page) = state.cache.get(&key).await {
        return Ok(cached_response(page, Lookup::Hit, policy));
    }

    let review =
        state.store.reviews().get(review_key(&id)?).await?.ok_or_else(review_not_found)?;

    // Tagged by sequence id so a write through either key form drops it.
    let tags = vec![CacheTag::Review(review.id.to_string()).to_string()];
    let page = CachedPage::new(to_json(&review)?, JSON, tags, policy.ttl);
    state.cache.put(key, page.clone()).await;
    Ok(cached_response(page, Lookup::Miss, policy))
}

pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<ReviewInput>,
) -> AppResult<Json<Review>> {
    let review =
        state.store.reviews().update(review_key(&id)?, input).await?.ok_or_else(review_not_found)?;
    invalidate(&state, Invalidation::Tag(CacheTag::Review(review.id.to_string()))).await;
    Ok(Json(review))
}

pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let review =
        state.store.reviews().delete(review_key(&id)?).await?.ok_or_else(review_not_found)?;
    invalidate(&state, Invalidation::Tag(CacheTag::Review(review.id.to_string()))).await;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevalidateParams {
    tag: Option<String>,
    movie_slug: Option<String>,
    path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Revalidated {
    revalidated: bool,
    tag: String,
    removed: usize,
}

pub async fn revalidate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RevalidateParams>,
) -> AppResult<Json<Revalidated>> {
    let given = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let tag = given(params.tag);
    let movie_slug = given(params.movie_slug);
    let path = given(params.path);

    let mut targets = Vec::new();
    if let Some(tag) = &tag {
        targets.push(Invalidation::Tag(CacheTag::parse(tag)));
    }
    let movie_slug = movie_slug.map(|slug| slug.to_lowercase());
    if let Some(slug) = &movie_slug {
        targets.push(Invalidation::Tag(CacheTag::Movie(slug.clone())));
    }
    if let Some(path) = &path {
        targets.push(Invalidation::Path(path.clone()));
    }
    if targets.is_empty() {
        return Err(AppError::validation("Missing tag, movieSlug or path parameter"));
    }

    if state.limiter.check().is_err() {
        debug!("revalidation rate limited");
        return Err(AppError::RateLimited);
    }

    let mut removed = 0;
    for target in targets {
        removed += state.revalidator.apply(target).await?;
    }

    let tag = tag
        .or_else(|| movie_slug.map(|slug| CacheTag::Movie(slug).to_string()))
        .or(path)
        .unwrap_or_default();
    info!(tag = %tag, removed, "revalidated on request");
    Ok(Json(Revalidated { revalidated: true, tag, removed }))
}

pub async fn revalidation_audit(State(state): State<Arc<AppState>>) -> Json<Vec<AuditEntry>> {
    Json(state.revalidator.audit().await)
}

pub async fn migrate_languages(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<serde_json::Value>> {
    let updated = state.store.movies().migrate_languages().await?;
    invalidate(&state, Invalidation::Tag(CacheTag::Movies)).await;
    Ok(Json(json!({
        "success": true,
        "message": "Successfully migrated language fields to ISO codes",
        "updated": updated,
    })))
}

/// Drop the cached reads a write affects before the write responds. A
/// failure is logged and never fails the write.
async fn invalidate(state: &AppState, target: Invalidation) {
    if let Err(err) = state.revalidator.apply(target.clone()).await {
        warn!(target = %target, error = %err, "cache invalidation failed");
    }
}

fn review_key(raw: &str) -> AppResult<ReviewKey> {
    ReviewKey::parse(raw).ok_or_else(review_not_found)
}

fn review_not_found() -> AppError {
    AppError::not_found("Review not found")
}

fn to_json<T: Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string(value).map_err(|err| AppError::Internal(err.into()))
}
