use patient_service::{app, fixtures, AppState, ErrorBody, InMemoryPatientRepository, Patient};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;

/// Serves a seeded in-memory app on an ephemeral port and returns its base URL.
async fn spawn_server() -> String {
    let repo = Arc::new(InMemoryPatientRepository::new());
    fixtures::seed(repo.as_ref()).await.expect("Failed to seed fixtures");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read local address");

    tokio::spawn(async move {
        axum::serve(listener, app(AppState::new(repo)))
            .await
            .expect("Server error");
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_create_patient() {
    let base_url = spawn_server().await;
    let client = Client::new();

    let patient = json!({
        "givenName": "Max",
        "familyName": "Colorado",
        "birthDate": "1942-12-11"
    });

    let response = client
        .post(format!("{}/patient", base_url))
        .json(&patient)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let created_patient: Patient = response.json().await.expect("Failed to parse response");
    assert!(created_patient.id.is_some());
    assert_eq!(created_patient.given_name.as_deref(), Some("Max"));
    assert_eq!(
        created_patient.birth_date.map(|d| d.to_string()),
        Some("1942-12-11".to_string())
    );
}

#[tokio::test]
async fn test_get_patient() {
    let base_url = spawn_server().await;
    let client = Client::new();

    // First create a patient
    let patient = json!({
        "givenName": "Jane",
        "familyName": "Smith",
        "birthDate": "1985-05-15"
    });

    let create_response = client
        .post(format!("{}/patient", base_url))
        .json(&patient)
        .send()
        .await
        .expect("Failed to create patient");

    let created_patient: Patient = create_response.json().await.expect("Failed to parse response");
    let patient_id = created_patient.id.unwrap();

    // Now get the patient
    let get_response = client
        .get(format!("{}/patient/{}", base_url, patient_id))
        .send()
        .await
        .expect("Failed to get patient");

    assert_eq!(get_response.status(), 200);

    let retrieved_patient: Patient = get_response.json().await.expect("Failed to parse response");
    assert_eq!(retrieved_patient, created_patient);
}

#[tokio::test]
async fn test_get_missing_patient() {
    let base_url = spawn_server().await;

    let response = Client::new()
        .get(format!("{}/patient/999", base_url))
        .send()
        .await
        .expect("Failed to get patient");

    assert_eq!(response.status(), 404);
    assert!(response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json")));

    let body: ErrorBody = response.json().await.expect("Failed to parse error body");
    assert_eq!(body.status, 404);
    assert_eq!(body.path, "/patient/999");
    assert!(body.message.contains("999"));
}

#[tokio::test]
async fn test_list_seeded_patients() {
    let base_url = spawn_server().await;

    let response = Client::new()
        .get(format!("{}/patient", base_url))
        .send()
        .await
        .expect("Failed to list patients");

    assert_eq!(response.status(), 200);

    let patients: Vec<Patient> = response.json().await.expect("Failed to parse response");
    assert_eq!(patients, fixtures::sample_patients());
}
