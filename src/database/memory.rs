use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{PatientRepository, RepoResult};
use crate::error::RepositoryError;
use crate::models::Patient;

/// Process-local repository. Ids start at 1 and are never handed out twice.
#[derive(Debug)]
pub struct InMemoryPatientRepository {
    state: RwLock<State>,
}

#[derive(Debug)]
struct State {
    rows: BTreeMap<i64, Patient>,
    /// `None` once `i64::MAX` has been used.
    next_id: Option<i64>,
}

impl InMemoryPatientRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                rows: BTreeMap::new(),
                next_id: Some(1),
            }),
        }
    }
}

impl Default for InMemoryPatientRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatientRepository for InMemoryPatientRepository {
    async fn save(&self, mut patient: Patient) -> RepoResult<Patient> {
        let mut state = self.state.write().await;

        let id = match patient.id {
            Some(id) => {
                state.next_id = match (state.next_id, id.checked_add(1)) {
                    (Some(next), Some(after)) => Some(next.max(after)),
                    _ => None,
                };
                id
            }
            None => {
                let id = state.next_id.ok_or(RepositoryError::IdSpaceExhausted)?;
                state.next_id = id.checked_add(1);
                id
            }
        };

        patient.id = Some(id);
        state.rows.insert(id, patient.clone());
        Ok(patient)
    }

    async fn update(&self, id: i64, mut patient: Patient) -> RepoResult<Option<Patient>> {
        let mut state = self.state.write().await;

        match state.rows.get_mut(&id) {
            Some(row) => {
                patient.id = Some(id);
                *row = patient.clone();
                Ok(Some(patient))
            }
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Patient>> {
        Ok(self.state.read().await.rows.get(&id).cloned())
    }

    async fn find_all(&self) -> RepoResult<Vec<Patient>> {
        Ok(self.state.read().await.rows.values().cloned().collect())
    }

    async fn exists_by_id(&self, id: i64) -> RepoResult<bool> {
        Ok(self.state.read().await.rows.contains_key(&id))
    }

    async fn delete_by_id(&self, id: i64) -> RepoResult<bool> {
        Ok(self.state.write().await.rows.remove(&id).is_some())
    }

    async fn count(&self) -> RepoResult<i64> {
        Ok(self.state.read().await.rows.len() as i64)
    }
}
