mod memory;

pub use memory::InMemoryPatientRepository;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;
use crate::conversion::{to_storage, PatientRow};
use crate::error::RepositoryError;
use crate::models::Patient;

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Storage contract for patient records.
///
/// A missing record is `Ok(None)` / `Ok(false)`; `Err` means the store failed.
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Inserts a transient patient or writes the row named by `patient.id`.
    /// Returns the persisted state with its id.
    async fn save(&self, patient: Patient) -> RepoResult<Patient>;

    /// Overwrites the row `id` only if it still exists; `Ok(None)` otherwise.
    /// Never creates a row.
    async fn update(&self, id: i64, patient: Patient) -> RepoResult<Option<Patient>>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Patient>>;

    /// All patients, ascending by id.
    async fn find_all(&self) -> RepoResult<Vec<Patient>>;

    async fn exists_by_id(&self, id: i64) -> RepoResult<bool>;

    /// Returns whether a row was removed.
    async fn delete_by_id(&self, id: i64) -> RepoResult<bool>;

    async fn count(&self) -> RepoResult<i64>;
}

const PATIENT_COLUMNS: &str = "id, given_name, family_name, birth_date";

/// PostgreSQL-backed repository over the `patient` table.
#[derive(Clone)]
pub struct PgPatientRepository {
    pool: PgPool,
}

impl PgPatientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config) -> RepoResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations in `migrations/`.
    pub async fn migrate(&self) -> RepoResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert(&self, patient: Patient) -> RepoResult<Patient> {
        let row: PatientRow = sqlx::query_as(&format!(
            "INSERT INTO patient (given_name, family_name, birth_date)
             VALUES ($1, $2, $3)
             RETURNING {PATIENT_COLUMNS}"
        ))
        .bind(patient.given_name)
        .bind(patient.family_name)
        .bind(to_storage(patient.birth_date))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn upsert(&self, id: i64, patient: Patient) -> RepoResult<Patient> {
        let mut tx = self.pool.begin().await?;

        let row: PatientRow = sqlx::query_as(&format!(
            "INSERT INTO patient (id, given_name, family_name, birth_date)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE
             SET given_name = EXCLUDED.given_name,
                 family_name = EXCLUDED.family_name,
                 birth_date = EXCLUDED.birth_date
             RETURNING {PATIENT_COLUMNS}"
        ))
        .bind(id)
        .bind(patient.given_name)
        .bind(patient.family_name)
        .bind(to_storage(patient.birth_date))
        .fetch_one(&mut *tx)
        .await?;

        // Move the identity sequence forward only, so generated ids never
        // collide with explicitly written ones.
        sqlx::query(
            "SELECT setval(
                 pg_get_serial_sequence('patient', 'id'),
                 GREATEST(
                     $1,
                     COALESCE(pg_sequence_last_value(pg_get_serial_sequence('patient', 'id')::regclass), 0),
                     1
                 )
             )",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }
}

#[async_trait]
impl PatientRepository for PgPatientRepository {
    async fn save(&self, patient: Patient) -> RepoResult<Patient> {
        match patient.id {
            None => self.insert(patient).await,
            Some(id) => self.upsert(id, patient).await,
        }
    }

    async fn update(&self, id: i64, patient: Patient) -> RepoResult<Option<Patient>> {
        let row: Option<PatientRow> = sqlx::query_as(&format!(
            "UPDATE patient
             SET given_name = $2, family_name = $3, birth_date = $4
             WHERE id = $1
             RETURNING {PATIENT_COLUMNS}"
        ))
        .bind(id)
        .bind(patient.given_name)
        .bind(patient.family_name)
        .bind(to_storage(patient.birth_date))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Patient::try_from).transpose()
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Patient>> {
        tracing::debug!(patient_id = id, "loading patient");

        let row: Option<PatientRow> = sqlx::query_as(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patient WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Patient::try_from).transpose()
    }

    async fn find_all(&self) -> RepoResult<Vec<Patient>> {
        let rows: Vec<PatientRow> = sqlx::query_as(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patient ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Patient::try_from).collect()
    }

    async fn exists_by_id(&self, id: i64) -> RepoResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM patient WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn delete_by_id(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM patient WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patient")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
