use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use tracing::debug;

use super::{AppState, HTML, XML, cached_response, detail_key};
use crate::{
    content::{self, LATEST_COUNT},
    error::{AppError, AppResult, PageError},
    feed,
    models::{ListQuery, Movie, SortField, SortOrder},
    page_cache::{CachePolicy, CachedPage, Lookup},
    revalidate::CacheTag,
    sitemap,
    slug::{slug_from_url, slugify},
    templates,
};

pub const INDEX_PAGE_SIZE: u64 = 24;

pub async fn home(State(state): State<Arc<AppState>>) -> Result<Response, PageError> {
    let (page, lookup) = state
        .cache
        .get_or_render(
            "/",
            vec![CacheTag::Movies.to_string()],
            HTML,
            CachePolicy::HOME,
            async {
                let movies = state.store.movies();
                let latest = movies.latest(LATEST_COUNT).await?;
                let excluded: Vec<i32> = latest.iter().map(|m| m.id).collect();
                let week = content::week_of(jiff::Zoned::now().date());
                let featured = movies.featured(&excluded, week).await?;
                Ok::<_, AppError>(templates::home_page(&latest, &featured))
            },
        )
        .await?;

    Ok(cached_response(page, lookup, CachePolicy::HOME))
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    sort: Option<String>,
    page: Option<String>,
}

pub async fn reviews_index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IndexParams>,
) -> Result<Response, PageError> {
    let sort = params.sort.as_deref().and_then(SortField::parse).unwrap_or(SortField::UpdatedAt);
    let order = if sort == SortField::Title { SortOrder::Asc } else { SortOrder::Desc };
    let page_no =
        params.page.as_deref().and_then(|p| p.trim().parse::<u64>().ok()).unwrap_or(1).max(1);
    let query = ListQuery {
        limit: INDEX_PAGE_SIZE,
        skip: (page_no - 1).saturating_mul(INDEX_PAGE_SIZE),
        sort,
        order,
    };

    let key = format!("/reviews?sort={}&page={page_no}", sort.as_str());

    let (page, lookup) = state
        .cache
        .get_or_render(
            &key,
            vec![CacheTag::Movies.to_string()],
            HTML,
            CachePolicy::LISTING,
            async {
                let listing = state.store.movies().list(&query).await?;
                Ok::<_, AppError>(templates::reviews_index(&listing, sort, page_no))
            },
        )
        .await?;

    Ok(cached_response(page, lookup, CachePolicy::LISTING))
}

pub async fn review(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response, PageError> {
    let key = detail_key(&slug);
    let policy = CachePolicy::DETAIL;
    if let Some(page) = state.cache.get(&key).await {
        return Ok(cached_response(page, Lookup::Hit, policy));
    }

    let movie = state
        .store
        .movies()
        .by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found(format!("no review for `{slug}`")))?;

    let tags = detail_tags(&movie, &slug);
    debug!(key = %key, ?tags, "rendering review page");
    let body = templates::review_page(&movie, &state.site_url);
    let page = CachedPage::new(body, HTML, tags, policy.ttl);
    state.cache.put(key, page.clone()).await;
    Ok(cached_response(page, Lookup::Miss, policy))
}

/// Tags for a rendered detail page: the stored slug, the slug it was requested
/// under, and the legacy slug from its source URL. Invalidating any one of
/// them drops the page.
fn detail_tags(movie: &Movie, requested: &str) -> Vec<String> {
    let legacy = slugify(slug_from_url(movie.url.trim_end_matches('/')));
    let candidates = [movie.slug.clone(), requested.trim().to_lowercase(), legacy];
    let mut tags: Vec<String> = Vec::with_capacity(candidates.len());
    for slug in candidates.into_iter().filter(|s| !s.is_empty()) {
        let tag = CacheTag::Movie(slug).to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

pub async fn feed_xml(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let (page, lookup) = state
        .cache
        .get_or_render(
            "/feed.xml",
            vec![CacheTag::Movies.to_string()],
            XML,
            CachePolicy::FEED,
            async {
                let records = state.store.movies().feed_records().await?;
                let now = jiff::Timestamp::now();
                Ok::<_, AppError>(feed::render_rss(&state.site_url, &records, now))
            },
        )
        .await?;

    Ok(cached_response(page, lookup, CachePolicy::FEED))
}

pub async fn sitemap_xml(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let (page, lookup) = state
        .cache
        .get_or_render(
            "/sitemap.xml",
            vec![CacheTag::Movies.to_string()],
            XML,
            CachePolicy::SITEMAP,
            async {
                let records = state.store.movies().feed_records().await?;
                let entries = sitemap::entries(&state.site_url, &records, jiff::Timestamp::now());
                Ok::<_, AppError>(sitemap::render_xml(&entries))
            },
        )
        .await?;

    Ok(cached_response(page, lookup, CachePolicy::SITEMAP))
}

pub async fn not_found() -> PageError {
    PageError(AppError::not_found("page not found"))
}
