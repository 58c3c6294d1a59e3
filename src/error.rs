use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Request},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// The requested entity does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct NotFoundError {
    pub message: String,
}

impl NotFoundError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn patient(id: i64) -> Self {
        Self::new(format!("Patient with id {} not found", id))
    }
}

/// Failure of the backing store. A missing record is never reported here.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("invalid persisted patient data: {0}")]
    InvalidData(String),
    #[error("patient id space exhausted")]
    IdSpaceExhausted,
}

/// Errors a handler hands back to the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error("{0}")]
    MalformedInput(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// Coarse classification used for the status table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    MalformedInput,
    PayloadTooLarge,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::MalformedInput => StatusCode::BAD_REQUEST,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn malformed(message: impl Into<String>) -> Self {
        ApiError::MalformedInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::MalformedInput(_) => ErrorKind::MalformedInput,
            ApiError::PayloadTooLarge(_) => ErrorKind::PayloadTooLarge,
            ApiError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Message shown to the client. Storage details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::NotFound(err) => err.message.clone(),
            ApiError::MalformedInput(message) | ApiError::PayloadTooLarge(message) => {
                message.clone()
            }
            ApiError::Storage(_) => "An unexpected error occurred".to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // the body limit is not the client's JSON being wrong
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::MalformedInput(rejection.body_text())
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::MalformedInput(rejection.body_text())
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            status: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            message: message.into(),
            path: path.into(),
        }
    }
}

/// Carried on error responses until [`error_boundary`] fills in the path.
#[derive(Debug, Clone)]
struct ErrorReport {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage(err) = &self {
            tracing::error!(error = %err, "storage failure");
        }

        let status = self.kind().status();
        let message = self.public_message();
        (
            status,
            Extension(ErrorReport {
                message: message.clone(),
            }),
            Json(ErrorBody::new(status, message, "")),
        )
            .into_response()
    }
}

/// Renders every 4xx/5xx response as an [`ErrorBody`] carrying the request path.
///
/// Responses produced by [`ApiError`] keep their message. Bare error
/// responses from the router (unknown method, oversized body) get the
/// status reason as their message.
pub async fn error_boundary(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (mut parts, _body) = response.into_parts();
    let message = match parts.extensions.remove::<ErrorReport>() {
        Some(report) => report.message,
        None => status
            .canonical_reason()
            .unwrap_or("Unknown Error")
            .to_string(),
    };

    let mut rendered = (status, Json(ErrorBody::new(status, message, path))).into_response();
    for (name, value) in parts.headers.iter() {
        if *name != header::CONTENT_TYPE && *name != header::CONTENT_LENGTH {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        assert_eq!(ErrorKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::MalformedInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorKind::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ErrorKind::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message_names_id() {
        let err = NotFoundError::patient(999);
        assert_eq!(err.to_string(), "Patient with id 999 not found");
        assert_eq!(ApiError::from(err).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_storage_error_is_internal_and_generic() {
        let err = ApiError::from(RepositoryError::from(sqlx::Error::PoolTimedOut));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.public_message(), "An unexpected error occurred");

        for err in [
            RepositoryError::IdSpaceExhausted,
            RepositoryError::InvalidData("birth_date +10000-01-01 out of range".to_string()),
        ] {
            let err = ApiError::from(err);
            assert_eq!(err.kind(), ErrorKind::Internal);
            assert_eq!(err.public_message(), "An unexpected error occurred");
        }
    }

    #[test]
    fn test_error_body_fields() {
        let body = ErrorBody::new(StatusCode::NOT_FOUND, "gone", "/patient/3");
        assert_eq!(body.status, 404);
        assert_eq!(body.error, "Not Found");
        assert_eq!(body.message, "gone");
        assert_eq!(body.path, "/patient/3");
        assert!(chrono::DateTime::parse_from_rfc3339(&body.timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_api_error_response_is_json() {
        let response = ApiError::malformed("bad date").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.status, 400);
        assert_eq!(body.error, "Bad Request");
        assert_eq!(body.message, "bad date");
    }
}
