use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, SqlErr, sea_query::SimpleExpr,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    entities::review,
    error::{AppError, AppResult},
    models::{Review, ReviewInput},
    slug::slugify,
};

/// Upper bound on id allocation attempts when concurrent creates collide.
const MAX_ID_ATTEMPTS: usize = 8;

/// How a review is addressed in a URL: its store-native uid or the legacy
/// integer sequence id.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReviewKey {
    Uid(Uuid),
    Legacy(i32),
}

impl ReviewKey {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(uid) = Uuid::parse_str(raw) {
            return Some(Self::Uid(uid));
        }
        raw.parse::<i32>().ok().map(Self::Legacy)
    }

    fn condition(self) -> SimpleExpr {
        match self {
            Self::Uid(uid) => review::Column::Uid.eq(uid.to_string()),
            Self::Legacy(id) => review::Column::Id.eq(id),
        }
    }
}

/// Handle on the `reviews` collection.
#[derive(Clone, Debug)]
pub struct Reviews {
    db: DatabaseConnection,
}

impl Reviews {
    pub(crate) fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn all(&self) -> AppResult<Vec<Review>> {
        let rows = review::Entity::find().order_by_asc(review::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    pub async fn get(&self, key: ReviewKey) -> AppResult<Option<Review>> {
        Ok(self.find(key).await?.map(Review::from))
    }

    /// Insert a review under the next sequence id. The primary key rejects a
    /// duplicate id; on conflict the max is re-read and the insert retried.
    pub async fn create(&self, input: ReviewInput) -> AppResult<Review> {
        let title = input.title.as_deref().map(str::trim).unwrap_or_default().to_string();
        if title.is_empty() {
            return Err(AppError::validation("title is required"));
        }

        let uid = Uuid::new_v4().to_string();
        let created_at = jiff::Timestamp::now().to_string();
        let slug = input.slug.clone().unwrap_or_else(|| slugify(&title));

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = self.next_id().await?;
            let model = review::ActiveModel {
                id: Set(id),
                uid: Set(uid.clone()),
                title: Set(title.clone()),
                content: Set(input.content.clone().unwrap_or_default()),
                film_title: Set(input.film_title.clone().unwrap_or_default()),
                director: Set(input.director.clone().unwrap_or_default()),
                year: Set(input.year),
                rating: Set(input.rating),
                slug: Set(slug.clone()),
                author_id: Set(input.author_id.clone()),
                created_at: Set(created_at.clone()),
                updated_at: Set(None),
            };

            match model.insert(&self.db).await {
                Ok(saved) => {
                    info!(id = saved.id, uid = %saved.uid, "review created");
                    return Ok(saved.into());
                },
                Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    warn!(id, attempt, "review id already taken, retrying");
                },
                Err(err) => return Err(err.into()),
            }
        }

        Err(AppError::Internal(anyhow::anyhow!(
            "could not allocate a review id after {MAX_ID_ATTEMPTS} attempts"
        )))
    }

    /// Overwrite the fields present in `input`. `None` when no review matches.
    pub async fn update(&self, key: ReviewKey, input: ReviewInput) -> AppResult<Option<Review>> {
        let Some(existing) = self.find(key).await? else {
            return Ok(None);
        };

        let mut active: review::ActiveModel = existing.into();
        if let Some(title) = input.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::validation("title must not be empty"));
            }
            active.title = Set(title);
        }
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(film_title) = input.film_title {
            active.film_title = Set(film_title);
        }
        if let Some(director) = input.director {
            active.director = Set(director);
        }
        if let Some(year) = input.year {
            active.year = Set(Some(year));
        }
        if let Some(rating) = input.rating {
            active.rating = Set(Some(rating));
        }
        if let Some(slug) = input.slug {
            active.slug = Set(slug);
        }
        if let Some(author_id) = input.author_id {
            active.author_id = Set(Some(author_id));
        }
        active.updated_at = Set(Some(jiff::Timestamp::now().to_string()));

        let saved = active.update(&self.db).await?;
        debug!(id = saved.id, "review updated");
        Ok(Some(saved.into()))
    }

    /// Remove a review, returning it when one matched.
    pub async fn delete(&self, key: ReviewKey) -> AppResult<Option<Review>> {
        let Some(existing) = self.find(key).await? else {
            return Ok(None);
        };
        let removed = Review::from(existing.clone());
        existing.delete(&self.db).await?;
        info!(id = removed.id, "review deleted");
        Ok(Some(removed))
    }

    async fn find(&self, key: ReviewKey) -> AppResult<Option<review::Model>> {
        Ok(review::Entity::find().filter(key.condition()).one(&self.db).await?)
    }

    async fn next_id(&self) -> AppResult<i32> {
        let last = review::Entity::find().order_by_desc(review::Column::Id).one(&self.db).await?;
        Ok(last.map(|r| r.id + 1).unwrap_or(1))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::store::Store;

    fn titled(title: &str) -> ReviewInput {
        ReviewInput { title: Some(title.to_string()), ..Default::default() }
    }

    #[test]
    fn key_parsing() {
        assert_eq!(ReviewKey::parse("12"), Some(ReviewKey::Legacy(12)));
        let uid = Uuid::new_v4();
        assert_eq!(ReviewKey::parse(&uid.to_string()), Some(ReviewKey::Uid(uid)));
        assert_eq!(ReviewKey::parse("twelve"), None);
    }

    #[tokio::test]
    async fn ids_are_sequential() {
        let reviews = Store::in_memory().await.unwrap().reviews();
        let first = reviews.create(titled("X")).await.unwrap();
        let second = reviews.create(titled("Y")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.slug, "x");
        assert_ne!(first.uid, second.uid);
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let reviews = Store::in_memory().await.unwrap().reviews();
        let creates = (0..4).map(|i| {
            let reviews = reviews.clone();
            async move { reviews.create(titled(&format!("Review {i}"))).await }
        });
        let created = futures::future::try_join_all(creates).await.unwrap();
        let ids: HashSet<i32> = created.iter().map(|r| r.id).collect();
        assert_eq!(ids, HashSet::from([1, 2, 3, 4]));
    }

    #[tokio::test]
    async fn lookup_by_uid_or_legacy_id() {
        let reviews = Store::in_memory().await.unwrap().reviews();
        let created = reviews.create(titled("Mirror")).await.unwrap();
        let uid = Uuid::parse_str(&created.uid).unwrap();

        let by_uid = reviews.get(ReviewKey::Uid(uid)).await.unwrap().unwrap();
        let by_id = reviews.get(ReviewKey::Legacy(created.id)).await.unwrap().unwrap();
        assert_eq!(by_uid, by_id);
        assert!(reviews.get(ReviewKey::Legacy(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_only_touches_given_fields() {
        let reviews = Store::in_memory().await.unwrap().reviews();
        let created = reviews
            .create(ReviewInput {
                title: Some("Ordet".into()),
                director: Some("Carl Theodor Dreyer".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let patch = ReviewInput { rating: Some(9.5), ..Default::default() };
        let updated = reviews.update(ReviewKey::Legacy(created.id), patch).await.unwrap().unwrap();
        assert_eq!(updated.title, "Ordet");
        assert_eq!(updated.director, "Carl Theodor Dreyer");
        assert_eq!(updated.rating, Some(9.5));
        assert!(updated.updated_at.is_some());

        let missing = reviews.update(ReviewKey::Legacy(42), ReviewInput::default()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn delete_then_get_is_none() {
        let reviews = Store::in_memory().await.unwrap().reviews();
        let created = reviews.create(titled("X")).await.unwrap();
        assert!(reviews.delete(ReviewKey::Legacy(created.id)).await.unwrap().is_some());
        assert!(reviews.get(ReviewKey::Legacy(created.id)).await.unwrap().is_none());
        assert!(reviews.delete(ReviewKey::Legacy(created.id)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_requires_title() {
        let reviews = Store::in_memory().await.unwrap().reviews();
        let err = reviews.create(ReviewInput::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
