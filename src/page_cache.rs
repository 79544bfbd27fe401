use std::{future::Future, sync::Arc, time::Duration};

use moka::{Expiry, future::Cache};
use tokio::time::Instant;
use tracing::debug;

/// How long a rendered response stays fresh and what `Cache-Control` it carries.
#[derive(Clone, Copy, Debug)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub header: &'static str,
}

impl CachePolicy {
    pub const HOME: Self = Self::new(3600, "public, s-maxage=3600, stale-while-revalidate=86400");
    pub const LISTING: Self =
        Self::new(3600, "public, s-maxage=3600, stale-while-revalidate=86400");
    pub const DETAIL: Self = Self::new(60, "public, s-maxage=60, stale-while-revalidate=60");
    pub const FEED: Self =
        Self::new(3600, "public, max-age=3600, s-maxage=3600, stale-while-revalidate=86400");
    pub const SITEMAP: Self = Self::new(60, "public, s-maxage=60, stale-while-revalidate=60");
    pub const REVIEWS: Self = Self::new(60, "public, s-maxage=60, stale-while-revalidate=30");
    pub const REVIEW: Self = Self::new(30, "public, s-maxage=30, stale-while-revalidate=10");

    const fn new(secs: u64, header: &'static str) -> Self {
        Self { ttl: Duration::from_secs(secs), header }
    }
}

#[derive(Clone, Debug)]
pub struct CachedPage {
    pub body: String,
    pub content_type: &'static str,
    pub tags: Vec<String>,
    ttl: Duration,
    expires_at: Instant,
}

impl CachedPage {
    pub fn new(
        body: String,
        content_type: &'static str,
        tags: Vec<String>,
        ttl: Duration,
    ) -> Self {
        Self { body, content_type, tags, ttl, expires_at: Instant::now() + ttl }
    }

    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Whether a lookup was served from the cache.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Lookup {
    Hit,
    Miss,
}

impl Lookup {
    pub fn as_str(self) -> &'static str {
        match self {
            Lookup::Hit => "HIT",
            Lookup::Miss => "MISS",
        }
    }
}

/// Upper bound on cached responses.
pub const MAX_ENTRIES: u64 = 10_000;

/// Evicts each entry once its own policy TTL has passed.
struct PolicyExpiry;

impl Expiry<String, CachedPage> for PolicyExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        page: &CachedPage,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(page.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        page: &CachedPage,
        _updated_at: std::time::Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(page.ttl)
    }
}

/// In-process cache of rendered responses.
///
/// Keys are built by the handlers from the parameters they actually read, so
/// unrelated query strings never create new entries.
#[derive(Clone)]
pub struct PageCache {
    entries: Cache<String, CachedPage>,
}

impl Default for PageCache {
    fn default() -> Self {
        Self::with_capacity(MAX_ENTRIES)
    }
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        let entries = Cache::builder().max_capacity(max_entries).expire_after(PolicyExpiry).build();
        Self { entries }
    }

    pub async fn get(&self, key: &str) -> Option<CachedPage> {
        let key = key.to_string();
        let page = self.entries.get(&key).await?;
        if page.is_fresh() {
            return Some(page);
        }
        self.entries.invalidate(&key).await;
        None
    }

    pub async fn put(&self, key: impl Into<String>, page: CachedPage) {
        self.entries.insert(key.into(), page).await;
    }

    /// Serve `key` from the cache or render, store and return it. Render
    /// errors are returned as-is and nothing is stored.
    pub async fn get_or_render<F, E>(
        &self,
        key: &str,
        tags: Vec<String>,
        content_type: &'static str,
        policy: CachePolicy,
        render: F,
    ) -> Result<(CachedPage, Lookup), E>
    where
        F: Future<Output = Result<String, E>>,
    {
        if let Some(page) = self.get(key).await {
            return Ok((page, Lookup::Hit));
        }

        let body = render.await?;
        let page = CachedPage::new(body, content_type, tags, policy.ttl);
        self.put(key, page.clone()).await;
        debug!(key = %key, "page rendered and cached");
        Ok((page, Lookup::Miss))
    }

    /// Drop every entry carrying a tag that satisfies `matches`.
    pub async fn invalidate_tags(&self, matches: impl Fn(&str) -> bool) -> usize {
        self.invalidate_where(|_, page| page.tags.iter().any(|t| matches(t))).await
    }

    /// Drop every entry for `path`, whatever its query string.
    pub async fn invalidate_path(&self, path: &str) -> usize {
        let path = path.trim_end_matches('/');
        self.invalidate_where(|key, _| {
            let key_path = key.split('?').next().unwrap_or_default();
            key_path.trim_end_matches('/').eq_ignore_ascii_case(path)
        })
        .await
    }

    async fn invalidate_where(&self, matches: impl Fn(&str, &CachedPage) -> bool) -> usize {
        let doomed: Vec<Arc<String>> = self
            .entries
            .iter()
            .filter(|(key, page)| matches(key, page))
            .map(|(key, _)| key)
            .collect();
        for key in &doomed {
            self.entries.invalidate(&**key).await;
        }
        doomed.len()
    }

    /// Number of live entries, after pending evictions have run.
    pub async fn len(&self) -> usize {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count() as usize
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(tags: &[&str]) -> CachedPage {
        CachedPage::new(
            "<html/>".into(),
            "text/html",
            tags.iter().map(|t| t.to_string()).collect(),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn render_once_then_hit() {
        let cache = PageCache::new();
        let (first, lookup) = cache
            .get_or_render("/", vec!["movies".into()], "text/html", CachePolicy::HOME, async {
                Ok::<_, ()>("one".to_string())
            })
            .await
            .unwrap();
        assert_eq!(lookup, Lookup::Miss);
        assert_eq!(first.body, "one");

        let (second, lookup) = cache
            .get_or_render("/", vec![], "text/html", CachePolicy::HOME, async {
                Ok::<_, ()>("two".to_string())
            })
            .await
            .unwrap();
        assert_eq!(lookup, Lookup::Hit);
        assert_eq!(second.body, "one");
    }

    #[tokio::test]
    async fn render_errors_are_not_cached() {
        let cache = PageCache::new();
        let result = cache
            .get_or_render("/reviews/missing", vec![], "text/html", CachePolicy::DETAIL, async {
                Err::<String, _>("not found")
            })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire() {
        let cache = PageCache::new();
        cache.put("/feed.xml", page(&["movies"])).await;
        assert!(cache.get("/feed.xml").await.is_some());
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("/feed.xml").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn capacity_is_bounded() {
        let cache = PageCache::with_capacity(16);
        for i in 0..500 {
            cache.put(format!("/feed.xml?cb={i}"), page(&["movies"])).await;
        }
        assert!(cache.len().await <= 16);
    }

    #[tokio::test]
    async fn rewriting_a_key_replaces_its_entry() {
        let cache = PageCache::new();
        cache.put("/", page(&["movies"])).await;
        cache.put("/", page(&["movies", "reviews"])).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("/").await.unwrap().tags.len(), 2);
    }

    #[tokio::test]
    async fn invalidate_by_tag_and_path() {
        let cache = PageCache::new();
        cache.put("/", page(&["movies"])).await;
        cache.put("/reviews?sort=title", page(&["movies"])).await;
        cache.put("/reviews/stalker", page(&["movie-stalker"])).await;
        cache.put("/api/reviews", page(&["reviews"])).await;

        assert_eq!(cache.invalidate_tags(|t| t == "movies").await, 2);
        assert_eq!(cache.len().await, 2);

        assert_eq!(cache.invalidate_path("/reviews/stalker/").await, 1);
        assert!(cache.get("/api/reviews").await.is_some());
    }
}
