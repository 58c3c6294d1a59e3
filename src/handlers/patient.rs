use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::{ApiJson, ApiPath};
use crate::error::{ApiError, NotFoundError};
use crate::models::Patient;
use crate::AppState;

/// POST /patient
/// Create a new patient; any `id` in the body is ignored
pub async fn create_patient(
    State(state): State<AppState>,
    ApiJson(mut patient): ApiJson<Patient>,
) -> Result<Response, ApiError> {
    patient.id = None;

    let created = state.repo.save(patient).await?;

    let mut response = (StatusCode::CREATED, Json(&created)).into_response();
    if let Some(id) = created.id {
        if let Ok(location) = HeaderValue::from_str(&format!("/patient/{}", id)) {
            response.headers_mut().insert(header::LOCATION, location);
        }
        tracing::info!("✓ Patient created: {}", id);
    }

    Ok(response)
}

/// GET /patient/:id
/// Retrieve a patient by ID
pub async fn get_patient(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Patient>, ApiError> {
    state
        .repo
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| NotFoundError::patient(id).into())
}

/// GET /patient
/// List every stored patient
pub async fn list_patients(State(state): State<AppState>) -> Result<Json<Vec<Patient>>, ApiError> {
    let patients = state.repo.find_all().await?;

    tracing::debug!("✓ Listed {} patients", patients.len());
    Ok(Json(patients))
}

/// PUT /patient/:id
/// Replace every field of an existing patient
pub async fn update_patient(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patient): ApiJson<Patient>,
) -> Result<Json<Patient>, ApiError> {
    // the path decides which record is written; a row deleted meanwhile stays deleted
    let updated = state
        .repo
        .update(id, patient)
        .await?
        .ok_or_else(|| NotFoundError::patient(id))?;

    tracing::info!("✓ Patient updated: {}", id);
    Ok(Json(updated))
}

/// DELETE /patient/:id
pub async fn delete_patient(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.repo.delete_by_id(id).await? {
        return Err(NotFoundError::patient(id).into());
    }

    tracing::info!("✓ Patient deleted: {}", id);
    Ok(StatusCode::NO_CONTENT)
}
