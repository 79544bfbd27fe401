pub mod api;
pub mod pages;

use std::{num::NonZeroU32, sync::Arc};

use axum::{
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use tokio::task::JoinHandle;

use crate::{
    models::ListQuery,
    page_cache::{CachePolicy, CachedPage, Lookup, PageCache},
    revalidate::Revalidator,
    store::Store,
};

pub(crate) const HTML: &str = "text/html; charset=utf-8";
pub(crate) const JSON: &str = "application/json";
pub(crate) const XML: &str = "application/xml";

static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

pub type RevalidateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct AppState {
    pub store: Store,
    pub cache: PageCache,
    pub revalidator: Revalidator,
    pub limiter: RevalidateLimiter,
    pub site_url: String,
}

impl AppState {
    /// Build the shared state and start the invalidation worker.
    pub fn new(
        store: Store,
        site_url: impl Into<String>,
        revalidate_rps: u32,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let cache = PageCache::new();
        let (revalidator, worker) = Revalidator::spawn(cache.clone());
        let rps = NonZeroU32::new(revalidate_rps).unwrap_or(NonZeroU32::MIN);
        let state = Self {
            store,
            cache,
            revalidator,
            limiter: RateLimiter::direct(Quota::per_second(rps)),
            site_url: site_url.into().trim_end_matches('/').to_string(),
        };
        (Arc::new(state), worker)
    }
}

/// Cache key for a listing: the path plus the validated query, in a fixed
/// order. Parameters the handler ignores never reach the key.
pub(crate) fn listing_key(path: &str, query: &ListQuery) -> String {
    format!(
        "{path}?limit={}&skip={}&sort={}&order={}",
        query.limit,
        query.skip,
        query.sort.as_str(),
        query.order.as_str()
    )
}

/// Detail pages resolve slugs case-insensitively, so they share one key.
pub(crate) fn detail_key(slug: &str) -> String {
    format!("/reviews/{}", slug.trim().to_lowercase())
}

pub(crate) fn cached_response(page: CachedPage, lookup: Lookup, policy: CachePolicy) -> Response {
    let mut resp =
        (StatusCode::OK, [(header::CONTENT_TYPE, page.content_type)], page.body).into_response();
    let headers = resp.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(policy.header));
    headers.insert(X_CACHE.clone(), HeaderValue::from_static(lookup.as_str()));
    resp
}
