//! Cache invalidation.
//!
//! Mutations emit an [`Invalidation`] through a [`Revalidator`]; a worker task
//! applies it to the [`PageCache`] and records the outcome in a bounded audit
//! log. Callers wait for the worker so a read after a write never sees the
//! old render, but a failed invalidation is reported to them rather than
//! raised.

use std::{
    collections::VecDeque,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::Serialize;
use tokio::{
    sync::{Mutex, mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    page_cache::PageCache,
};

const AUDIT_CAPACITY: usize = 256;

/// Logical invalidation key attached to cached responses.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheTag {
    Movies,
    Reviews,
    Movie(String),
    Review(String),
    Other(String),
}

impl CacheTag {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "movies" => Self::Movies,
            "reviews" => Self::Reviews,
            _ => {
                if let Some(slug) = raw.strip_prefix("movie-") {
                    Self::Movie(slug.to_string())
                } else if let Some(id) = raw.strip_prefix("review-") {
                    Self::Review(id.to_string())
                } else {
                    Self::Other(raw.to_string())
                }
            },
        }
    }

    /// Whether invalidating `self` drops a cache entry tagged `entry_tag`.
    ///
    /// An item tag also drops its aggregate listing; an aggregate drops every
    /// item beneath it.
    pub fn covers(&self, entry_tag: &str) -> bool {
        match self {
            Self::Movies => entry_tag == "movies" || entry_tag.starts_with("movie-"),
            Self::Reviews => entry_tag == "reviews" || entry_tag.starts_with("review-"),
            Self::Movie(_) => entry_tag == "movies" || entry_tag == self.to_string(),
            Self::Review(_) => entry_tag == "reviews" || entry_tag == self.to_string(),
            Self::Other(tag) => entry_tag == tag.as_str(),
        }
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movies => f.write_str("movies"),
            Self::Reviews => f.write_str("reviews"),
            Self::Movie(slug) => write!(f, "movie-{slug}"),
            Self::Review(id) => write!(f, "review-{id}"),
            Self::Other(tag) => f.write_str(tag),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invalidation {
    Tag(CacheTag),
    Path(String),
}

impl fmt::Display for Invalidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "tag:{tag}"),
            Self::Path(path) => write!(f, "path:{path}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Pending,
    Applied,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub seq: u64,
    pub target: String,
    pub status: AuditStatus,
    pub removed: usize,
    pub requested_at: String,
    pub applied_at: Option<String>,
}

struct Job {
    seq: u64,
    target: Invalidation,
    done: oneshot::Sender<usize>,
}

type AuditLog = Arc<Mutex<VecDeque<AuditEntry>>>;

/// Sending half of the invalidation pipeline.
#[derive(Clone)]
pub struct Revalidator {
    tx: mpsc::UnboundedSender<Job>,
    audit: AuditLog,
    next_seq: Arc<AtomicU64>,
}

impl Revalidator {
    /// Start the worker. It runs until every `Revalidator` clone is dropped.
    pub fn spawn(cache: PageCache) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let audit: AuditLog = Arc::new(Mutex::new(VecDeque::with_capacity(AUDIT_CAPACITY)));
        let handle = tokio::spawn(run_worker(cache, rx, audit.clone()));
        (Self { tx, audit, next_seq: Arc::new(AtomicU64::new(1)) }, handle)
    }

    /// Queue an invalidation and wait until it has been applied. Returns the
    /// number of cache entries removed.
    pub async fn apply(&self, target: Invalidation) -> AppResult<usize> {
        let seq = self.record(&target).await;
        let (done, applied) = oneshot::channel();
        self.tx.send(Job { seq, target, done }).map_err(|_| {
            AppError::Internal(anyhow::anyhow!("revalidation worker is not running"))
        })?;
        applied
            .await
            .map_err(|_| AppError::Internal(anyhow::anyhow!("revalidation worker stopped")))
    }

    /// Recent invalidations, oldest first.
    pub async fn audit(&self) -> Vec<AuditEntry> {
        self.audit.lock().await.iter().cloned().collect()
    }

    async fn record(&self, target: &Invalidation) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut log = self.audit.lock().await;
        if log.len() == AUDIT_CAPACITY {
            log.pop_front();
        }
        log.push_back(AuditEntry {
            seq,
            target: target.to_string(),
            status: AuditStatus::Pending,
            removed: 0,
            requested_at: jiff::Timestamp::now().to_string(),
            applied_at: None,
        });
        seq
    }
}

async fn run_worker(cache: PageCache, mut rx: mpsc::UnboundedReceiver<Job>, audit: AuditLog) {
    while let Some(job) = rx.recv().await {
        let removed = match &job.target {
            Invalidation::Tag(tag) => cache.invalidate_tags(|t| tag.covers(t)).await,
            Invalidation::Path(path) => cache.invalidate_path(path).await,
        };
        debug!(seq = job.seq, target = %job.target, removed, "invalidation applied");

        if let Some(entry) = audit.lock().await.iter_mut().find(|e| e.seq == job.seq) {
            entry.status = AuditStatus::Applied;
            entry.removed = removed;
            entry.applied_at = Some(jiff::Timestamp::now().to_string());
        }

        // The caller may have given up waiting.
        let _ = job.done.send(removed);
    }
    info!("revalidation worker stopped");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::page_cache::CachedPage;

    async fn cache_with(entries: &[(&str, &str)]) -> PageCache {
        let cache = PageCache::new();
        for (key, tag) in entries {
            let tags = vec![tag.to_string()];
            let page = CachedPage::new(String::new(), "text/html", tags, Duration::from_secs(60));
            cache.put(*key, page).await;
        }
        cache
    }

    #[test]
    fn tag_round_trip() {
        for raw in ["movies", "reviews", "movie-stalker", "review-12", "homepage"] {
            assert_eq!(CacheTag::parse(raw).to_string(), raw);
        }
        assert_eq!(CacheTag::parse("review-12"), CacheTag::Review("12".into()));
    }

    #[test]
    fn item_tags_cover_their_aggregate() {
        let tag = CacheTag::Review("3".into());
        assert!(tag.covers("review-3"));
        assert!(tag.covers("reviews"));
        assert!(!tag.covers("review-4"));
        assert!(!tag.covers("movies"));

        let tag = CacheTag::Movie("stalker".into());
        assert!(tag.covers("movies"));
        assert!(!tag.covers("movie-solaris"));

        assert!(CacheTag::Movies.covers("movie-solaris"));
        assert!(!CacheTag::Movies.covers("reviews"));
    }

    #[tokio::test]
    async fn apply_waits_for_worker() {
        let cache = cache_with(&[
            ("/", "movies"),
            ("/reviews/stalker", "movie-stalker"),
            ("/reviews/solaris", "movie-solaris"),
        ])
        .await;
        let (revalidator, _worker) = Revalidator::spawn(cache.clone());

        let removed =
            revalidator.apply(Invalidation::Tag(CacheTag::Movie("stalker".into()))).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.len().await, 1);

        let audit = revalidator.audit().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].status, AuditStatus::Applied);
        assert_eq!(audit[0].target, "tag:movie-stalker");
    }

    #[tokio::test]
    async fn jobs_are_applied_in_order() {
        let cache =
            cache_with(&[("/api/reviews", "reviews"), ("/api/reviews/1", "review-1")]).await;
        let (revalidator, _worker) = Revalidator::spawn(cache.clone());

        let (first, second) = tokio::join!(
            revalidator.apply(Invalidation::Path("/api/reviews/1".into())),
            revalidator.apply(Invalidation::Tag(CacheTag::Other("none".into()))),
        );
        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 0);

        assert_eq!(cache.len().await, 1);
        let audit = revalidator.audit().await;
        assert!(audit.iter().all(|e| e.status == AuditStatus::Applied));
        assert_eq!(audit.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn apply_after_worker_stops_fails_and_stays_pending() {
        let (revalidator, worker) = Revalidator::spawn(PageCache::new());
        worker.abort();
        let _ = worker.await;

        assert!(revalidator.apply(Invalidation::Tag(CacheTag::Reviews)).await.is_err());
        let audit = revalidator.audit().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].status, AuditStatus::Pending);
    }
}
