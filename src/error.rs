use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("slug `{0}` is already taken by another title")]
    SlugConflict(String),

    #[error("too many requests")]
    RateLimited,

    #[error(transparent)]
    Store(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SlugConflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to a client. Upstream failures are logged and replaced.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Store(err) => {
                tracing::error!(error = %err, "store failure");
                "Internal Server Error".to_string()
            },
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal failure");
                "Internal Server Error".to_string()
            },
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.public_message() }));
        let mut resp = (status, body).into_response();
        if status.is_server_error() {
            resp.headers_mut().insert(
                axum::http::header::CACHE_CONTROL,
                axum::http::HeaderValue::from_static("no-store"),
            );
        }
        resp
    }
}

/// Error surfaced from an HTML page handler.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<sea_orm::DbErr> for PageError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(AppError::Store(err))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let body = if status == StatusCode::NOT_FOUND {
            crate::templates::not_found_page()
        } else {
            crate::templates::error_page(self.0.public_message())
        };
        (status, Html(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_hide_details() {
        let err = AppError::Store(sea_orm::DbErr::Custom("disk I/O error at page 12".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal Server Error");
    }

    #[test]
    fn validation_message_is_passed_through() {
        let err = AppError::validation("Invalid limit parameter. Must be between 1 and 100.");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Invalid limit parameter. Must be between 1 and 100.");
    }
}
