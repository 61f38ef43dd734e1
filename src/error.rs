use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Controller-level failure taxonomy. Every variant maps to a status code and
/// a JSON body `{"error": "..."}`; internal detail is never echoed to clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{}", message.as_deref().unwrap_or("Authentication required"))]
    Unauthenticated { message: Option<String> },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-safe message. Internal errors collapse to a generic string.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// 401 with the default "Authentication required" body.
    pub fn unauthenticated() -> Self {
        ApiError::Unauthenticated { message: None }
    }

    /// 401 with the generic login failure message; deliberately identical for
    /// unknown email and wrong password.
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthenticated {
            message: Some("Invalid credentials".into()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(anyhow::Error::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

/// Postgres unique-constraint violation (SQLSTATE 23505). Duplicate votes and
/// registration races are detected through this rather than pre-locking.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Postgres foreign-key violation (SQLSTATE 23503), e.g. inserting a vote for
/// a dilemma deleted since the existence check.
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ApiError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::unauthenticated().status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("no".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("missing".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_never_leak_detail() {
        let err = ApiError::Internal(anyhow::anyhow!("connection to 10.0.0.3 refused"));
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = ApiError::Conflict("Username already exists".into());
        assert_eq!(err.user_message(), "Username already exists");
    }

    #[test]
    fn unauthenticated_messages() {
        assert_eq!(
            ApiError::unauthenticated().user_message(),
            "Authentication required"
        );
        assert_eq!(
            ApiError::invalid_credentials().user_message(),
            "Invalid credentials"
        );
    }
}
