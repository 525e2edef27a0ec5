use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::record;

/// An agendized topic (TOP) belonging to zero or one board meeting.
///
/// `board_meeting` null means the item is orphaned and pooled for reuse.
/// `start_time` is never persisted; it is derived from the owning meeting's
/// start plus the cumulative duration of all prior items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub board_meeting: Option<i64>,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default)]
    pub duration_in_minutes: i64,
    pub title: String,
    #[serde(default)]
    pub additional_participants: String,
    #[serde(default)]
    pub is_misc: bool,
    #[serde(default)]
    pub needs_decision: bool,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub file_location_id: Option<String>,
    #[serde(default)]
    pub protocol_location_id: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    /// Derived, transient; not a column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Marks items the client created but never saved.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_new: bool,
}

impl AgendaItem {
    pub fn from_record(storage: &Map<String, Value>) -> Result<Self, AppError> {
        let domain = record::to_domain_record(storage);
        Ok(serde_json::from_value(Value::Object(domain))?)
    }

    pub fn from_records(records: &[Map<String, Value>]) -> Result<Vec<Self>, AppError> {
        records.iter().map(Self::from_record).collect()
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
            .map(|start| start + Duration::minutes(self.duration_in_minutes))
    }
}

/// Stamp each item's derived start time: the meeting start plus the summed
/// durations of everything before it, in order.
pub fn calculate_timestamps(start: DateTime<Utc>, items: &mut [AgendaItem]) {
    let mut cumulative = 0i64;
    for item in items.iter_mut() {
        item.start_time = Some(start + Duration::minutes(cumulative));
        cumulative += item.duration_in_minutes;
    }
}

/// Meeting end = start plus the sum of all item durations.
pub fn calculate_end_time(start: DateTime<Utc>, items: &[AgendaItem]) -> DateTime<Utc> {
    let total: i64 = items.iter().map(|item| item.duration_in_minutes).sum();
    start + Duration::minutes(total)
}
