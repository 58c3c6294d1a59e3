use chrono::{Datelike, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Patient record as exchanged over HTTP and held by the repository.
///
/// `id` is `None` until the repository persists the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "givenName", default)]
    pub given_name: Option<String>,
    #[serde(rename = "familyName", default)]
    pub family_name: Option<String>,
    #[serde(rename = "birthDate", default)]
    pub birth_date: Option<BirthDate>,
}

impl Patient {
    pub fn new(
        given_name: impl Into<String>,
        family_name: impl Into<String>,
        birth_date: Option<BirthDate>,
    ) -> Self {
        Self {
            id: None,
            given_name: Some(given_name.into()),
            family_name: Some(family_name.into()),
            birth_date,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// True until the repository has assigned an id.
    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }
}

/// Calendar date without a time of day or zone.
///
/// The wire form is always `YYYY-MM-DD`, so years are limited to 0..=9999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BirthDate(NaiveDate);

impl BirthDate {
    pub const MIN_YEAR: i32 = 0;
    pub const MAX_YEAR: i32 = 9999;

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(Self::from_naive)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// `None` when the year has no four-digit form.
    pub fn from_naive(date: NaiveDate) -> Option<Self> {
        (Self::MIN_YEAR..=Self::MAX_YEAR)
            .contains(&date.year())
            .then_some(Self(date))
    }

    pub(crate) fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date `{0}`, expected YYYY-MM-DD")]
pub struct BirthDateParseError(String);

impl FromStr for BirthDate {
    type Err = BirthDateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono alone accepts unpadded fields and signed years
        let bytes = s.as_bytes();
        let shaped = bytes.len() == 10
            && bytes.iter().enumerate().all(|(i, b)| match i {
                4 | 7 => *b == b'-',
                _ => b.is_ascii_digit(),
            });
        if !shaped {
            return Err(BirthDateParseError(s.to_string()));
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(Self::from_naive)
            .ok_or_else(|| BirthDateParseError(s.to_string()))
    }
}

impl fmt::Display for BirthDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl Serialize for BirthDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BirthDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
