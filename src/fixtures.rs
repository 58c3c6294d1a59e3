//! Known patient records for seeding a fresh store.

use crate::database::{PatientRepository, RepoResult};
use crate::models::{BirthDate, Patient};

pub fn sample_patients() -> Vec<Patient> {
    vec![
        Patient::new("Phillip", "Spec", BirthDate::from_ymd(1972, 5, 5)).with_id(1),
        Patient::new("Sally", "Certify", BirthDate::from_ymd(1973, 6, 6)).with_id(2),
    ]
}

/// Writes [`sample_patients`] with their fixed ids.
pub async fn seed(repo: &dyn PatientRepository) -> RepoResult<Vec<Patient>> {
    let mut seeded = Vec::new();
    for patient in sample_patients() {
        seeded.push(repo.save(patient).await?);
    }

    tracing::info!(count = seeded.len(), "seeded fixture patients");
    Ok(seeded)
}
