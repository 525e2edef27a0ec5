//! Invite reconciliation: ground truth vs. the remote calendar.

pub mod automation;
pub mod status;

pub use status::{classify, relabel_for_send, InviteKind, InviteStatus};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::config::{CalendarConfig, DriveConfig};
use crate::errors::AppError;
use crate::graph::calendar::{CalendarStore, EventPayload};
use crate::graph::drive::{self, DirectoryStore};
use crate::graph::profiles::ProfileStore;
use crate::models::agenda_item::{calculate_end_time, AgendaItem};
use crate::models::board_meeting::{self, BoardMeeting};
use crate::models::participants;
use crate::models::agenda_item as agenda_item_queries;
use status::{ExpectedInvite, ObservedInvite};

/// One row of the invite overview: a meeting or agenda item joined with its
/// freshly classified remote state. Never persisted; rebuilt on every pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteItem {
    pub id: i64,
    pub kind: InviteKind,
    pub title: String,
    pub status: InviteStatus,
    pub event_id: Option<String>,
    /// Raw semicolon-delimited participant list of this entity.
    pub participants: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub room: String,
    pub web_link: Option<String>,
}

/// Build the invite overview for a meeting and its (timestamp-derived)
/// agenda items, fetching and classifying every remote event.
pub async fn load_invite_items(
    calendar: &dyn CalendarStore,
    profiles: &dyn ProfileStore,
    meeting: &BoardMeeting,
    items: &[AgendaItem],
) -> Result<Vec<InviteItem>, AppError> {
    let meeting_id = meeting
        .id
        .ok_or_else(|| AppError::BadRequest("Board meeting id is missing".into()))?;
    let meeting_end = calculate_end_time(meeting.start_time, items);

    let mut invites = vec![InviteItem {
        id: meeting_id,
        kind: InviteKind::Meeting,
        title: meeting.title.clone(),
        status: InviteStatus::Created,
        event_id: meeting.event_id.clone(),
        participants: meeting.fixed_participants.clone(),
        start: meeting.start_time,
        end: meeting_end,
        room: meeting.room.clone(),
        web_link: None,
    }];

    for item in items {
        let start = item.start_time.ok_or_else(|| {
            AppError::BadRequest("Agenda item start time was not derived".into())
        })?;
        invites.push(InviteItem {
            id: item
                .id
                .ok_or_else(|| AppError::BadRequest("Agenda item without id".into()))?,
            kind: InviteKind::AgendaItem,
            title: item.title.clone(),
            status: InviteStatus::Created,
            event_id: item.event_id.clone(),
            participants: item.additional_participants.clone(),
            start,
            end: item.end_time().unwrap_or(start),
            room: meeting.room.clone(),
            web_link: None,
        });
    }

    for invite in &mut invites {
        let Some(event_id) = invite.event_id.clone().filter(|id| !id.is_empty()) else {
            invite.status = InviteStatus::Missing;
            continue;
        };
        match calendar.fetch_event(&event_id).await {
            Ok(None) => {
                invite.status = InviteStatus::Missing;
            }
            Ok(Some(event)) => {
                invite.web_link = event.web_link.clone();
                let expected_attendees = if invite.kind == InviteKind::AgendaItem {
                    let combined = participants::combine_participants(
                        &meeting.fixed_participants,
                        &invite.participants,
                    );
                    match profiles.primary_mails(&combined).await {
                        Ok(mails) => mails,
                        Err(err) => {
                            log::error!("Attendee resolution failed for '{}': {err}", invite.title);
                            invite.status = InviteStatus::Unknown;
                            continue;
                        }
                    }
                } else {
                    Vec::new()
                };
                let expected = ExpectedInvite {
                    kind: invite.kind,
                    subject: invite.title.clone(),
                    combined_subject: (invite.kind == InviteKind::AgendaItem)
                        .then(|| format!("{} - {}", meeting.title, invite.title)),
                    start: invite.start,
                    end: invite.end,
                    room: invite.room.clone(),
                    attendees: expected_attendees,
                };
                let observed = match (event.start.to_utc(), event.end.to_utc()) {
                    (Ok(start), Ok(end)) => ObservedInvite {
                        subject: event.subject.clone(),
                        is_draft: event.is_draft,
                        start,
                        end,
                        location: event.location_name().to_string(),
                        attendees: event.attendee_addresses(),
                    },
                    _ => {
                        log::error!("Unreadable event times for '{}'", invite.title);
                        invite.status = InviteStatus::Unknown;
                        continue;
                    }
                };
                invite.status = classify(&expected, Some(&observed));
            }
            Err(err) => {
                log::error!("Fetching calendar item for '{}' failed: {err}", invite.title);
                invite.status = InviteStatus::Unknown;
            }
        }
    }

    Ok(invites)
}

/// First name derived from the first configured host address:
/// `max.mustermann@…` becomes `Max`.
fn host_first_name(hosts: &str) -> String {
    let Some(first) = participants::split_participants(hosts).into_iter().next() else {
        return String::new();
    };
    let local = first.split('@').next().unwrap_or_default();
    let name = local.split('.').next().unwrap_or_default();
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn meeting_body_html(hosts: &str) -> String {
    let contact = participants::split_participants(hosts)
        .into_iter()
        .next()
        .unwrap_or_default();
    format!(
        "Dear participants,<br>\
         Should you wish to present a deck or one-pager, please send it to \
         <a href=\"mailto:{contact}\">{contact}</a> \
         <u><strong>48 hours prior to the meeting.</strong></u> \
         It will then be forwarded to the board.<br>Best,<br>{}",
        host_first_name(hosts)
    )
}

fn local_wall_time(
    instant: DateTime<Utc>,
    meeting: &BoardMeeting,
) -> Result<String, AppError> {
    Ok(instant
        .with_timezone(&meeting.zone()?)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string())
}

/// The meeting-level event: hosts as attendees, Teams online meeting,
/// sent directly (never a draft) so the join link exists right away.
pub fn meeting_event_payload(
    meeting: &BoardMeeting,
    items: &[AgendaItem],
    calendar_config: &CalendarConfig,
) -> Result<EventPayload, AppError> {
    let end = calculate_end_time(meeting.start_time, items);
    Ok(EventPayload {
        subject: meeting.title.clone(),
        start_local: local_wall_time(meeting.start_time, meeting)?,
        end_local: local_wall_time(end, meeting)?,
        time_zone: meeting.time_zone.clone(),
        room: meeting.room.clone(),
        attendees: participants::split_participants(&calendar_config.online_meeting_hosts),
        body_html: meeting_body_html(&calendar_config.online_meeting_hosts),
        is_draft: None,
        is_online_meeting: true,
    })
}

/// A per-item event: combined participant set, the meeting event's body,
/// draft unless it was already sent.
pub fn item_event_payload(
    meeting: &BoardMeeting,
    item: &AgendaItem,
    body_html: String,
    is_already_sent: bool,
) -> Result<EventPayload, AppError> {
    let start = item
        .start_time
        .ok_or_else(|| AppError::BadRequest("Agenda item start time was not derived".into()))?;
    let end = item.end_time().unwrap_or(start);
    Ok(EventPayload {
        subject: item.title.clone(),
        start_local: local_wall_time(start, meeting)?,
        end_local: local_wall_time(end, meeting)?,
        time_zone: meeting.time_zone.clone(),
        room: meeting.room.clone(),
        attendees: participants::combine_participants(
            &meeting.fixed_participants,
            &item.additional_participants,
        ),
        body_html,
        is_draft: Some(!is_already_sent),
        is_online_meeting: false,
    })
}

/// Result of creating or updating the meeting-level event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingEventResult {
    pub event_id: String,
    pub join_url: Option<String>,
}

/// Create or reschedule the meeting-level calendar event and persist the
/// linkage. On creation the Teams join link is also dropped into the meeting
/// folder as a `.url` shortcut (best effort).
pub async fn create_update_meeting_invite(
    pool: &PgPool,
    calendar: &dyn CalendarStore,
    directory: &dyn DirectoryStore,
    drives: &DriveConfig,
    calendar_config: &CalendarConfig,
    meeting: &BoardMeeting,
    items: &[AgendaItem],
    is_create_as_new: bool,
) -> Result<MeetingEventResult, AppError> {
    let meeting_id = meeting
        .id
        .ok_or_else(|| AppError::BadRequest("Board meeting id is missing".into()))?;
    let payload = meeting_event_payload(meeting, items, calendar_config)?;

    let event = if is_create_as_new {
        calendar.create_event(&payload).await?
    } else {
        let event_id = meeting
            .event_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AppError::BadRequest("Cannot update a meeting invite without an event id".into())
            })?;
        calendar.reschedule_event(event_id, &payload).await?
    };

    // A reschedule response may omit the online-meeting block; keep the
    // stored join link rather than clearing it.
    let join_url = event
        .join_url()
        .map(str::to_string)
        .or_else(|| meeting.meeting_link.clone());
    board_meeting::set_event(pool, meeting_id, &event.id, join_url.as_deref()).await?;

    if is_create_as_new {
        if let (Some(folder_id), Some(join)) = (&meeting.file_location_id, &join_url) {
            let refresh = async {
                drive::delete_link_files(directory, &drives.meetings_drive_id, folder_id).await?;
                drive::create_link_file(
                    directory,
                    &drives.meetings_drive_id,
                    folder_id,
                    join,
                    &format!("Join {}", crate::files::naming::safe_string(&meeting.title)),
                )
                .await
            };
            if let Err(err) = refresh.await {
                log::error!("Could not refresh join shortcut for meeting {meeting_id}: {err}");
            }
        }
    }

    Ok(MeetingEventResult {
        event_id: event.id,
        join_url,
    })
}

/// Create or update one agenda item's calendar event and persist its id.
///
/// Item invites require the meeting event to exist: they reuse its HTML body
/// and are pointless before the online-meeting link is confirmed.
pub async fn create_update_item_invite(
    pool: &PgPool,
    calendar: &dyn CalendarStore,
    meeting: &BoardMeeting,
    item: &AgendaItem,
    is_create_as_new: bool,
    is_already_sent: bool,
) -> Result<String, AppError> {
    let meeting_event_id = meeting
        .event_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest(
                "Agenda item invites require the meeting invite to exist first".into(),
            )
        })?;
    let item_id = item
        .id
        .ok_or_else(|| AppError::BadRequest("Agenda item id is missing".into()))?;

    let body = calendar.fetch_event_body(meeting_event_id).await?;
    let payload = item_event_payload(meeting, item, body, is_already_sent)?;

    let event = if is_create_as_new {
        calendar.create_event(&payload).await?
    } else {
        let event_id = item
            .event_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AppError::BadRequest("Cannot update an item invite without an event id".into())
            })?;
        calendar.update_event(event_id, &payload).await?
    };

    agenda_item_queries::set_event_id(pool, item_id, &event.id).await?;
    Ok(event.id)
}
