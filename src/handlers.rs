mod patient;

pub use patient::*;

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{StatusCode, Uri},
};

use crate::error::{ApiError, NotFoundError};

/// JSON body extractor whose rejections become 400 error bodies.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections become 400 error bodies.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

pub async fn fallback(uri: Uri) -> ApiError {
    NotFoundError::new(format!("No route for {}", uri.path())).into()
}
