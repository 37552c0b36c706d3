//! HTTP error taxonomy.
//!
//! # Responsibility
//! - Map service failures onto 400 / 404 / 500 responses.
//! - Keep response bodies to a single `{"error": "..."}` message.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use duetask_core::TaskServiceError;
use log::error;
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    Store(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(message) | Self::NotFound(message) | Self::Store(message) => message,
        }
    }

    pub fn task_not_found(id: impl Display) -> Self {
        Self::NotFound(format!("task not found: {id}"))
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl From<TaskServiceError> for ApiError {
    fn from(value: TaskServiceError) -> Self {
        match value {
            TaskServiceError::Validation(err) => Self::Validation(err.to_string()),
            TaskServiceError::NotFound(id) => Self::task_not_found(id),
            TaskServiceError::Store(err) => {
                error!("event=api_error module=api status=error error_code=store_failure error={err}");
                Self::Store("task store operation failed".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::Validation(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message(),
        });
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use duetask_core::db::DbError;
    use duetask_core::{RepoError, TaskServiceError, TaskValidationError};
    use uuid::Uuid;

    #[test]
    fn service_errors_map_to_status_codes() {
        let validation: ApiError =
            TaskServiceError::Validation(TaskValidationError::EmptyTitle).into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let id = Uuid::new_v4();
        let not_found: ApiError = TaskServiceError::NotFound(id).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert!(not_found.message().contains(&id.to_string()));

        let store: ApiError = TaskServiceError::Store(RepoError::Db(
            DbError::InvalidConnectionString("secret://x".to_string()),
        ))
        .into();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!store.message().contains("secret"));
    }
}
