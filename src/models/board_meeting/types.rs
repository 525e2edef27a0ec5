use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::record;

/// The top-level scheduled session entity.
///
/// `start_time` is a UTC instant; `time_zone` carries the IANA zone the
/// meeting is anchored to, so wall-clock rendering never depends on the
/// server's locale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMeeting {
    #[serde(default)]
    pub id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub fixed_participants: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub room: String,
    pub time_zone: String,
    #[serde(default)]
    pub meeting_link: Option<String>,
    #[serde(default)]
    pub file_location_id: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
}

impl BoardMeeting {
    pub fn zone(&self) -> Result<Tz, AppError> {
        Tz::from_str(&self.time_zone)
            .map_err(|_| AppError::BadRequest(format!("Unknown time zone: {}", self.time_zone)))
    }

    /// The meeting start as wall-clock time in its own zone.
    pub fn local_start(&self) -> Result<DateTime<Tz>, AppError> {
        Ok(self.start_time.with_timezone(&self.zone()?))
    }

    /// Title constraint: non-empty, at most 100 chars, folder-safe characters.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest("Title must not be empty".into()));
        }
        if self.title.chars().count() > 100 {
            return Err(AppError::BadRequest(
                "Title must be at most 100 characters".into(),
            ));
        }
        if self.title.chars().any(|c| c.is_control() || "/\\:*?\"<>|".contains(c)) {
            return Err(AppError::BadRequest(
                "Title contains characters that are not allowed".into(),
            ));
        }
        self.zone()?;
        Ok(())
    }

    pub fn from_record(storage: &Map<String, Value>) -> Result<Self, AppError> {
        let domain = record::to_domain_record(storage);
        Ok(serde_json::from_value(Value::Object(domain))?)
    }

    pub fn from_records(records: &[Map<String, Value>]) -> Result<Vec<Self>, AppError> {
        records.iter().map(Self::from_record).collect()
    }
}
