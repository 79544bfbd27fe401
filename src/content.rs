use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, SqlErr, TransactionTrait,
    sea_query::LikeExpr,
};
use tracing::{debug, info};

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    language,
    models::{FeedRecord, ListQuery, Movie, MovieCard, MoviePage, NewMovie, Pagination, SortOrder},
    slug::{escape_like, slugify},
};

pub const LATEST_COUNT: u64 = 3;
pub const FEATURED_COUNT: usize = 2;
/// The weekly offset cycles through this many title positions.
const FEATURED_WINDOW: u64 = 50;
const BACKFILL_POOL: u64 = 10;

/// Handle on the `movies` collection.
#[derive(Clone, Debug)]
pub struct Movies {
    db: DatabaseConnection,
}

impl Movies {
    pub(crate) fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn count(&self) -> AppResult<u64> {
        Ok(movie::Entity::find().count(&self.db).await?)
    }

    pub async fn list(&self, q: &ListQuery) -> AppResult<MoviePage> {
        let order = match q.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        let page = cards(movie::Entity::find())
            .order_by(q.sort.column(), order)
            .order_by_asc(movie::Column::Id)
            .offset(q.skip)
            .limit(q.limit)
            .into_model::<MovieCard>()
            .all(&self.db);

        let (total, movies) =
            futures::try_join!(self.count(), async { page.await.map_err(AppError::from) })?;
        debug!(total, returned = movies.len(), skip = q.skip, limit = q.limit, "listed movies");

        Ok(MoviePage { movies, pagination: Pagination::new(total, q.limit, q.skip) })
    }

    /// Most recently updated records, newest first.
    pub async fn latest(&self, n: u64) -> AppResult<Vec<MovieCard>> {
        Ok(cards(movie::Entity::find())
            .order_by_desc(movie::Column::UpdatedAt)
            .order_by_asc(movie::Column::Id)
            .limit(n)
            .into_model::<MovieCard>()
            .all(&self.db)
            .await?)
    }

    /// Two items for the homepage strip, rotating weekly.
    ///
    /// Candidates come from the eligible pool (records not in `excluded`) in
    /// three tiers, each consulted only while the selection is short:
    /// 1. title order, skipping `((week - 1) * 2) mod 50`;
    /// 2. title order from the start (wrap-around);
    /// 3. the ten most recently updated.
    ///
    /// The result holds [`FEATURED_COUNT`] distinct items whenever that many are
    /// eligible, fewer otherwise, and never an excluded id.
    pub async fn featured(&self, excluded: &[i32], week: u32) -> AppResult<Vec<MovieCard>> {
        let mut picker = FeaturedPicker::new(excluded);

        let window = self
            .eligible(excluded)
            .order_by_asc(movie::Column::Title)
            .order_by_asc(movie::Column::Id)
            .offset(featured_offset(week))
            .limit(FEATURED_COUNT as u64)
            .into_model::<MovieCard>()
            .all(&self.db)
            .await?;
        picker.offer(window);

        if !picker.is_full() {
            debug!(week, have = picker.len(), "featured window short, wrapping");
            let wrapped = self
                .eligible(excluded)
                .order_by_asc(movie::Column::Title)
                .order_by_asc(movie::Column::Id)
                .limit(FEATURED_COUNT as u64 * 2)
                .into_model::<MovieCard>()
                .all(&self.db)
                .await?;
            picker.offer(wrapped);
        }

        if !picker.is_full() {
            debug!(week, have = picker.len(), "featured still short, backfilling by recency");
            let recent = self
                .eligible(excluded)
                .order_by_desc(movie::Column::UpdatedAt)
                .order_by_asc(movie::Column::Id)
                .limit(BACKFILL_POOL)
                .into_model::<MovieCard>()
                .all(&self.db)
                .await?;
            picker.offer(recent);
        }

        Ok(picker.into_inner())
    }

    pub async fn by_id(&self, id: i32) -> AppResult<Option<Movie>> {
        Ok(movie::Entity::find_by_id(id).one(&self.db).await?.map(Movie::from))
    }

    /// Resolve a URL slug. The stored slug column is authoritative; records
    /// whose source URL ends in the slug are the fallback, lowest id first.
    pub async fn by_slug(&self, slug: &str) -> AppResult<Option<Movie>> {
        let slug = slug.trim().to_lowercase();
        if slug.is_empty() {
            return Ok(None);
        }

        if let Some(found) = movie::Entity::find()
            .filter(movie::Column::Slug.eq(slug.as_str()))
            .one(&self.db)
            .await?
        {
            return Ok(Some(found.into()));
        }

        let pattern = LikeExpr::new(format!("%{}", escape_like(&slug))).escape('!');
        let legacy = movie::Entity::find()
            .filter(movie::Column::Url.like(pattern))
            .order_by_asc(movie::Column::Id)
            .one(&self.db)
            .await?;
        if legacy.is_some() {
            debug!(slug = %slug, "resolved slug by source url suffix");
        }

        Ok(legacy.map(Movie::from))
    }

    /// Every record, trimmed to what the feed and sitemap render.
    pub async fn feed_records(&self) -> AppResult<Vec<FeedRecord>> {
        Ok(movie::Entity::find()
            .select_only()
            .columns([
                movie::Column::Title,
                movie::Column::Year,
                movie::Column::Description,
                movie::Column::UpdatedAt,
            ])
            .order_by_desc(movie::Column::UpdatedAt)
            .order_by_asc(movie::Column::Id)
            .into_model::<FeedRecord>()
            .all(&self.db)
            .await?)
    }

    /// Store a new record with its slug derived from the title.
    pub async fn insert(&self, new: NewMovie) -> AppResult<Movie> {
        let title = new.title.trim().to_string();
        let slug = slugify(&title);
        if slug.is_empty() {
            return Err(AppError::validation("title must contain at least one letter or digit"));
        }

        let rating = new.rating.unwrap_or(0.0);
        if !(0.0..=10.0).contains(&rating) {
            return Err(AppError::validation("rating must be between 0 and 10"));
        }

        let updated_at = new.updated_at.unwrap_or_else(|| jiff::Timestamp::now().to_string());

        let model = movie::ActiveModel {
            id: Default::default(),
            title: Set(title),
            slug: Set(slug.clone()),
            director: Set(new.director),
            cast: Set(new.cast),
            year: Set(new.year),
            duration: Set(new.duration),
            language: Set(new.language),
            rating: Set(rating),
            vote_count: Set(new.vote_count.unwrap_or(0)),
            description: Set(new.description),
            image_preview_url: Set(new.image_preview_url),
            image_url: Set(new.image_url),
            url: Set(new.url),
            updated_at: Set(Some(updated_at)),
        };

        match model.insert(&self.db).await {
            Ok(saved) => {
                info!(id = saved.id, slug = %saved.slug, "movie stored");
                Ok(saved.into())
            },
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AppError::SlugConflict(slug))
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Rewrite every language field into its ISO-code form. Returns how many
    /// records changed.
    pub async fn migrate_languages(&self) -> AppResult<usize> {
        let txn = self.db.begin().await?;

        let rows = movie::Entity::find().all(&txn).await?;
        let mut updated = 0;
        for row in rows {
            if row.language.trim().is_empty() {
                continue;
            }
            let codes = language::iso_codes(&row.language);
            if codes == row.language {
                continue;
            }
            debug!(id = row.id, from = %row.language, to = %codes, "migrating language");
            let mut active: movie::ActiveModel = row.into();
            active.language = Set(codes);
            active.update(&txn).await?;
            updated += 1;
        }

        txn.commit().await?;
        info!(updated, "language migration finished");
        Ok(updated)
    }

    fn eligible(&self, excluded: &[i32]) -> Select<movie::Entity> {
        cards(movie::Entity::find()).filter(movie::Column::Id.is_not_in(excluded.iter().copied()))
    }
}

fn cards(select: Select<movie::Entity>) -> Select<movie::Entity> {
    select.select_only().columns([
        movie::Column::Id,
        movie::Column::Title,
        movie::Column::Slug,
        movie::Column::Director,
        movie::Column::Year,
        movie::Column::Duration,
        movie::Column::Language,
        movie::Column::Rating,
        movie::Column::Description,
        movie::Column::ImagePreviewUrl,
        movie::Column::ImageUrl,
        movie::Column::Url,
        movie::Column::UpdatedAt,
    ])
}

/// Title-order offset for a week number (1-based).
pub fn featured_offset(week: u32) -> u64 {
    (u64::from(week.max(1)) - 1) * FEATURED_COUNT as u64 % FEATURED_WINDOW
}

/// 1-based week of the year, counted in Sunday-started weeks from the weekday
/// 1 January falls on.
pub fn week_of(date: jiff::civil::Date) -> u32 {
    let day = u32::from(date.day_of_year().unsigned_abs()) - 1;
    let jan1 = u32::from(date.first_of_year().weekday().to_sunday_zero_offset().unsigned_abs());
    (day + jan1 + 1).div_ceil(7)
}

/// Accumulates featured candidates, skipping excluded and already-picked ids.
struct FeaturedPicker<'a> {
    excluded: &'a [i32],
    picked: Vec<MovieCard>,
}

impl<'a> FeaturedPicker<'a> {
    fn new(excluded: &'a [i32]) -> Self {
        Self { excluded, picked: Vec::with_capacity(FEATURED_COUNT) }
    }

    fn offer(&mut self, candidates: impl IntoIterator<Item = MovieCard>) {
        for candidate in candidates {
            if self.is_full() {
                break;
            }
            if self.excluded.contains(&candidate.id)
                || self.picked.iter().any(|p| p.id == candidate.id)
            {
                continue;
            }
            self.picked.push(candidate);
        }
    }

    fn is_full(&self) -> bool {
        self.picked.len() >= FEATURED_COUNT
    }

    fn len(&self) -> usize {
        self.picked.len()
    }

    fn into_inner(self) -> Vec<MovieCard> {
        self.picked
    }
}
