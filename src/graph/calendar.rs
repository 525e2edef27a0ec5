//! Remote calendar operations against the shared event mailbox.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::graph::client::GraphClient;

/// A Graph event timestamp: local wall time plus a zone name.
#[derive(Debug, Clone, Deserialize)]
pub struct EventTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

impl EventTime {
    /// Resolve the wall time in its zone to a UTC instant.
    pub fn to_utc(&self) -> Result<DateTime<Utc>, AppError> {
        let zone = Tz::from_str(&self.time_zone).or_else(|_| {
            if self.time_zone.eq_ignore_ascii_case("UTC") {
                Ok(chrono_tz::UTC)
            } else {
                Err(AppError::BadRequest(format!(
                    "Unknown event time zone: {}",
                    self.time_zone
                )))
            }
        })?;
        // Graph pads fractional seconds; strip them before parsing.
        let trimmed = self.date_time.split('.').next().unwrap_or(&self.date_time);
        let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
            .map_err(|e| AppError::BadRequest(format!("Bad event timestamp: {e}")))?;
        naive
            .and_local_timezone(zone)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| {
                AppError::BadRequest(format!("Ambiguous event timestamp: {}", self.date_time))
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct EmailAddress {
    #[serde(default)]
    address: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Attendee {
    #[serde(rename = "emailAddress")]
    email_address: EmailAddress,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct Location {
    #[serde(rename = "displayName", default)]
    display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OnlineMeeting {
    #[serde(rename = "joinUrl", default)]
    join_url: Option<String>,
}

/// The observed state of a remote calendar event.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "isDraft", default)]
    pub is_draft: bool,
    #[serde(rename = "webLink", default)]
    pub web_link: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default)]
    location: Location,
    #[serde(default)]
    attendees: Vec<Attendee>,
    #[serde(rename = "onlineMeeting", default)]
    online_meeting: Option<OnlineMeeting>,
}

impl RemoteEvent {
    pub fn location_name(&self) -> &str {
        &self.location.display_name
    }

    pub fn attendee_addresses(&self) -> Vec<String> {
        self.attendees
            .iter()
            .map(|a| a.email_address.address.clone())
            .collect()
    }

    pub fn join_url(&self) -> Option<&str> {
        self.online_meeting.as_ref().and_then(|m| m.join_url.as_deref())
    }
}

/// Everything needed to create or replace an event.
#[derive(Debug, Clone)]
pub struct EventPayload {
    pub subject: String,
    /// Local wall time, `YYYY-MM-DDTHH:MM:SS`, interpreted in `time_zone`.
    pub start_local: String,
    pub end_local: String,
    pub time_zone: String,
    pub room: String,
    pub attendees: Vec<String>,
    pub body_html: String,
    /// `None` for online meetings, which are always sent directly.
    pub is_draft: Option<bool>,
    pub is_online_meeting: bool,
}

impl EventPayload {
    fn attendees_json(&self) -> Value {
        Value::Array(
            self.attendees
                .iter()
                .map(|address| {
                    json!({
                        "emailAddress": { "address": address, "name": "" },
                        "type": "required",
                    })
                })
                .collect(),
        )
    }

    /// The full event body for create and item-level update.
    pub fn to_event_json(&self) -> Value {
        let mut event = json!({
            "subject": self.subject,
            "start": { "dateTime": self.start_local, "timeZone": self.time_zone },
            "end": { "dateTime": self.end_local, "timeZone": self.time_zone },
            "location": { "displayName": self.room },
            "attendees": self.attendees_json(),
            "body": { "contentType": "HTML", "content": self.body_html },
            "reminderMinutesBeforeStart": 0,
            "isReminderOn": false,
        });
        if let Some(is_draft) = self.is_draft {
            event["isDraft"] = json!(is_draft);
        }
        if self.is_online_meeting {
            event["isOnlineMeeting"] = json!(true);
            event["onlineMeetingProvider"] = json!("teamsForBusiness");
        }
        event
    }

    /// The reduced patch used when rescheduling the meeting-level event:
    /// subject and times only, leaving body and attendees untouched.
    pub fn to_reschedule_json(&self) -> Value {
        json!({
            "subject": self.subject,
            "start": { "dateTime": self.start_local, "timeZone": self.time_zone },
            "end": { "dateTime": self.end_local, "timeZone": self.time_zone },
            "location": { "displayName": self.room },
        })
    }
}

#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn create_event(&self, payload: &EventPayload) -> Result<RemoteEvent, AppError>;

    /// Replace the whole event.
    async fn update_event(
        &self,
        event_id: &str,
        payload: &EventPayload,
    ) -> Result<RemoteEvent, AppError>;

    /// Patch subject, times and room only.
    async fn reschedule_event(
        &self,
        event_id: &str,
        payload: &EventPayload,
    ) -> Result<RemoteEvent, AppError>;

    async fn cancel_event(&self, event_id: &str) -> Result<(), AppError>;

    /// `Ok(None)` when the remote store no longer knows the event.
    async fn fetch_event(&self, event_id: &str) -> Result<Option<RemoteEvent>, AppError>;

    /// The event's HTML body with collapsed whitespace.
    async fn fetch_event_body(&self, event_id: &str) -> Result<String, AppError>;
}

pub struct GraphCalendarClient {
    client: GraphClient,
    mailbox: String,
}

impl GraphCalendarClient {
    pub fn new(client: GraphClient, mailbox: &str) -> Self {
        GraphCalendarClient {
            client,
            mailbox: mailbox.to_string(),
        }
    }

    fn events_path(&self) -> String {
        format!("/users/{}/calendar/events", self.mailbox)
    }

    fn event_path(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_path(), event_id)
    }
}

fn decode_event(value: Value) -> Result<RemoteEvent, AppError> {
    Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl CalendarStore for GraphCalendarClient {
    async fn create_event(&self, payload: &EventPayload) -> Result<RemoteEvent, AppError> {
        let created = self
            .client
            .post_json(&self.events_path(), &payload.to_event_json())
            .await?;
        decode_event(created)
    }

    async fn update_event(
        &self,
        event_id: &str,
        payload: &EventPayload,
    ) -> Result<RemoteEvent, AppError> {
        let updated = self
            .client
            .patch_json(&self.event_path(event_id), &payload.to_event_json())
            .await?;
        decode_event(updated)
    }

    async fn reschedule_event(
        &self,
        event_id: &str,
        payload: &EventPayload,
    ) -> Result<RemoteEvent, AppError> {
        let updated = self
            .client
            .patch_json(&self.event_path(event_id), &payload.to_reschedule_json())
            .await?;
        decode_event(updated)
    }

    async fn cancel_event(&self, event_id: &str) -> Result<(), AppError> {
        let path = format!("{}/cancel", self.event_path(event_id));
        self.client.post_json(&path, &json!({})).await?;
        Ok(())
    }

    async fn fetch_event(&self, event_id: &str) -> Result<Option<RemoteEvent>, AppError> {
        match self.client.get_json(&self.event_path(event_id)).await {
            Ok(value) => Ok(Some(decode_event(value)?)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn fetch_event_body(&self, event_id: &str) -> Result<String, AppError> {
        let path = format!("{}?$select=body", self.event_path(event_id));
        let event = self.client.get_json(&path).await?;
        let content = event
            .pointer("/body/content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(normalize_html_whitespace(content))
    }
}

/// Collapse CRLF and runs of whitespace into single spaces.
pub fn normalize_html_whitespace(html: &str) -> String {
    html.replace("\r\n", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
