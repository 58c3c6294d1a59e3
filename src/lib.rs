pub mod config;
pub mod conversion;
pub mod database;
pub mod error;
pub mod fixtures;
pub mod handlers;
pub mod models;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use database::{InMemoryPatientRepository, PatientRepository, PgPatientRepository};
pub use error::{ApiError, ErrorBody, NotFoundError, RepositoryError};
pub use models::{BirthDate, Patient};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn PatientRepository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn PatientRepository>) -> Self {
        Self { repo }
    }
}

/// Builds the router with every patient route.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/patient",
            post(handlers::create_patient).get(handlers::list_patients),
        )
        .route(
            "/patient/:id",
            get(handlers::get_patient)
                .put(handlers::update_patient)
                .delete(handlers::delete_patient),
        )
        .route("/health", get(handlers::health_check))
        .fallback(handlers::fallback)
        .layer(middleware::from_fn(error::error_boundary))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
