use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::{
    entities::{movie, review},
    error::{AppError, AppResult},
    language,
};

/// Display projection used by listings, the homepage and the featured strip.
#[derive(Clone, Debug, PartialEq, FromQueryResult, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieCard {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub director: String,
    pub year: Option<i32>,
    pub duration: Option<i32>,
    pub language: String,
    pub rating: f64,
    pub description: String,
    pub image_preview_url: String,
    pub image_url: String,
    pub url: String,
    pub updated_at: Option<String>,
}

impl MovieCard {
    pub fn language_name(&self) -> String {
        language::display_name(&self.language)
    }

    /// Full-size still, falling back to an upscaled preview.
    pub fn hero_image(&self) -> String {
        if self.image_url.is_empty() {
            self.image_preview_url.replace("?w=600", "?w=1920")
        } else {
            self.image_url.clone()
        }
    }
}

/// Full projection for a detail page.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub director: String,
    pub cast: Vec<String>,
    pub year: Option<i32>,
    pub duration: Option<i32>,
    pub language: String,
    pub language_name: String,
    pub rating: f64,
    pub vote_count: i32,
    pub description: String,
    pub image_preview_url: String,
    pub image_url: String,
    pub url: String,
    pub updated_at: Option<String>,
}

impl From<movie::Model> for Movie {
    fn from(m: movie::Model) -> Self {
        let cast = m
            .cast
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            id: m.id,
            language_name: language::display_name(&m.language),
            title: m.title,
            slug: m.slug,
            director: m.director,
            cast,
            year: m.year,
            duration: m.duration,
            language: m.language,
            rating: m.rating,
            vote_count: m.vote_count,
            description: m.description,
            image_preview_url: m.image_preview_url,
            image_url: m.image_url,
            url: m.url,
            updated_at: m.updated_at,
        }
    }
}

/// Minimal projection the feed and sitemap need.
#[derive(Clone, Debug, PartialEq, FromQueryResult)]
pub struct FeedRecord {
    pub title: String,
    pub year: Option<i32>,
    pub description: String,
    pub updated_at: Option<String>,
}

/// A movie as handed over by ingestion.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewMovie {
    pub title: String,
    pub director: String,
    pub cast: String,
    pub year: Option<i32>,
    pub duration: Option<i32>,
    pub language: String,
    pub rating: Option<f64>,
    #[serde(alias = "votecount")]
    pub vote_count: Option<i32>,
    pub description: String,
    #[serde(alias = "imagepreviewurl")]
    pub image_preview_url: String,
    #[serde(alias = "imageurl")]
    pub image_url: String,
    pub url: String,
    #[serde(alias = "updatedat")]
    pub updated_at: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortField {
    UpdatedAt,
    Title,
    Year,
    Duration,
    Rating,
    VoteCount,
}

impl SortField {
    /// Allow-listed sort keys. Unknown keys map to `None`.
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "updatedat" | "updated_at" | "added" => Some(Self::UpdatedAt),
            "title" => Some(Self::Title),
            "year" => Some(Self::Year),
            "duration" | "length" => Some(Self::Duration),
            "rating" => Some(Self::Rating),
            "votecount" | "vote_count" => Some(Self::VoteCount),
            _ => None,
        }
    }

    pub fn column(self) -> movie::Column {
        match self {
            Self::UpdatedAt => movie::Column::UpdatedAt,
            Self::Title => movie::Column::Title,
            Self::Year => movie::Column::Year,
            Self::Duration => movie::Column::Duration,
            Self::Rating => movie::Column::Rating,
            Self::VoteCount => movie::Column::VoteCount,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpdatedAt => "added",
            Self::Title => "title",
            Self::Year => "year",
            Self::Duration => "length",
            Self::Rating => "rating",
            Self::VoteCount => "votecount",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(order: Option<&str>) -> Self {
        match order {
            Some(o) if o.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

pub const DEFAULT_LIMIT: u64 = 50;
pub const MAX_LIMIT: u64 = 100;

/// A validated listing request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ListQuery {
    pub limit: u64,
    pub skip: u64,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT, skip: 0, sort: SortField::UpdatedAt, order: SortOrder::Desc }
    }
}

impl ListQuery {
    /// Validate raw query-string values.
    pub fn parse(
        limit: Option<&str>,
        skip: Option<&str>,
        sort: Option<&str>,
        order: Option<&str>,
    ) -> AppResult<Self> {
        let limit = match limit.filter(|s| !s.is_empty()) {
            None => DEFAULT_LIMIT as i64,
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| invalid_limit())?,
        };
        if limit < 1 || limit > MAX_LIMIT as i64 {
            return Err(invalid_limit());
        }

        let skip = match skip.filter(|s| !s.is_empty()) {
            None => 0,
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| invalid_skip())?,
        };
        if skip < 0 {
            return Err(invalid_skip());
        }

        let sort = match sort.filter(|s| !s.is_empty()) {
            None => SortField::UpdatedAt,
            Some(key) => SortField::parse(key).unwrap_or_else(|| {
                tracing::debug!(sort = %key, "ignoring unknown sort field");
                SortField::UpdatedAt
            }),
        };

        Ok(Self { limit: limit as u64, skip: skip as u64, sort, order: SortOrder::parse(order) })
    }
}

fn invalid_limit() -> AppError {
    AppError::validation("Invalid limit parameter. Must be between 1 and 100.")
}

fn invalid_skip() -> AppError {
    AppError::validation("Invalid skip parameter. Must be >= 0.")
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub limit: u64,
    pub skip: u64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(total: u64, limit: u64, skip: u64) -> Self {
        Self { total, limit, skip, has_more: skip + limit < total }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MoviePage {
    pub movies: Vec<MovieCard>,
    pub pagination: Pagination,
}

/// Editorial review article.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Review {
    pub id: i32,
    pub uid: String,
    pub title: String,
    pub content: String,
    pub film_title: String,
    pub director: String,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub slug: String,
    pub author_id: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<review::Model> for Review {
    fn from(m: review::Model) -> Self {
        Self {
            id: m.id,
            uid: m.uid,
            title: m.title,
            content: m.content,
            film_title: m.film_title,
            director: m.director,
            year: m.year,
            rating: m.rating,
            slug: m.slug,
            author_id: m.author_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Fields a client may send when creating or updating a review. On update
/// only the fields present are written.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReviewInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub film_title: Option<String>,
    pub director: Option<String>,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub slug: Option<String>,
    pub author_id: Option<String>,
}
