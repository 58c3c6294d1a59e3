//! Mapping between the domain model and PostgreSQL column types.
//!
//! `birth_date` is stored in a native `DATE` column. sqlx binds
//! [`NaiveDate`] to `DATE` directly, so year, month and day go over the wire
//! as a day count with no time-of-day or zone attached.

use chrono::NaiveDate;
use sqlx::FromRow;

use crate::error::RepositoryError;
use crate::models::{BirthDate, Patient};

/// Domain date to the value bound to the `DATE` column.
pub fn to_storage(date: Option<BirthDate>) -> Option<NaiveDate> {
    date.map(|d| d.as_naive())
}

/// `DATE` column value back to the domain date.
///
/// PostgreSQL accepts years a `BirthDate` cannot carry; those rows are
/// reported as invalid data rather than silently dropped.
pub fn from_storage(date: Option<NaiveDate>) -> Result<Option<BirthDate>, RepositoryError> {
    date.map(|d| {
        BirthDate::from_naive(d)
            .ok_or_else(|| RepositoryError::InvalidData(format!("birth_date {} out of range", d)))
    })
    .transpose()
}

/// One row of the `patient` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PatientRow {
    pub id: i64,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl TryFrom<PatientRow> for Patient {
    type Error = RepositoryError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(row.id),
            given_name: row.given_name,
            family_name: row.family_name,
            birth_date: from_storage(row.birth_date)?,
        })
    }
}
