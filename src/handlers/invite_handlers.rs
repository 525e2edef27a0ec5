//! Invite management endpoints: drift overview, per-invite create/update,
//! the bounded bulk automation, and raw event lookup.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;

use crate::auth::require_bearer;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::graph::calendar::CalendarStore;
use crate::graph::drive::DirectoryStore;
use crate::graph::profiles::ProfileStore;
use crate::invites::{self, automation, InviteItem};
use crate::models::agenda_item::{self, calculate_timestamps};
use crate::models::board_meeting;

#[derive(Debug, Deserialize)]
pub struct InviteStatusQuery {
    pub meeting: i64,
}

/// One row of the overview, enriched with the UI strings for its status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteOverviewRow {
    #[serde(flatten)]
    pub invite: InviteItem,
    pub message: &'static str,
    pub action_label: &'static str,
    pub is_action_enabled: bool,
}

/// GET /api/invites/status?meeting= — classify every invite of a meeting.
pub async fn status_overview(
    pool: web::Data<PgPool>,
    calendar: web::Data<dyn CalendarStore>,
    profiles: web::Data<dyn ProfileStore>,
    request: HttpRequest,
    query: web::Query<InviteStatusQuery>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let meeting = board_meeting::find_by_id(&pool, query.meeting)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut items = agenda_item::find_by_meeting(&pool, query.meeting).await?;
    calculate_timestamps(meeting.start_time, &mut items);

    let invites =
        invites::load_invite_items(calendar.as_ref(), profiles.as_ref(), &meeting, &items)
            .await?;
    let rows: Vec<InviteOverviewRow> = invites
        .into_iter()
        .map(|invite| InviteOverviewRow {
            message: invite.status.message(),
            action_label: invite.status.action_label(),
            is_action_enabled: invite.status.is_action_enabled(),
            invite,
        })
        .collect();
    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingInviteRequest {
    pub board_meeting_id: i64,
    pub is_create_as_new: bool,
}

/// POST /api/invites/meeting — create or reschedule the meeting-level event.
pub async fn meeting_invite(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    calendar: web::Data<dyn CalendarStore>,
    directory: web::Data<dyn DirectoryStore>,
    request: HttpRequest,
    body: web::Json<MeetingInviteRequest>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let meeting = board_meeting::find_by_id(&pool, body.board_meeting_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut items = agenda_item::find_by_meeting(&pool, body.board_meeting_id).await?;
    calculate_timestamps(meeting.start_time, &mut items);

    let result = invites::create_update_meeting_invite(
        &pool,
        calendar.as_ref(),
        directory.as_ref(),
        &config.drives,
        &config.calendar,
        &meeting,
        &items,
        body.is_create_as_new,
    )
    .await?;
    Ok(HttpResponse::Ok().json(result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInviteRequest {
    pub agenda_item_id: i64,
    pub is_create_as_new: bool,
    #[serde(default)]
    pub is_already_sent: bool,
}

/// POST /api/invites/agendaitem — create or update one item's event.
pub async fn item_invite(
    pool: web::Data<PgPool>,
    calendar: web::Data<dyn CalendarStore>,
    request: HttpRequest,
    body: web::Json<ItemInviteRequest>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let item = agenda_item::find_by_id(&pool, body.agenda_item_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let meeting_id = item.board_meeting.ok_or_else(|| {
        AppError::BadRequest("Agenda item is not assigned to a board meeting".into())
    })?;
    let meeting = board_meeting::find_by_id(&pool, meeting_id)
        .await?
        .ok_or(AppError::NotFound)?;

    // Re-derive the item with its start time in agenda context.
    let mut items = agenda_item::find_by_meeting(&pool, meeting_id).await?;
    calculate_timestamps(meeting.start_time, &mut items);
    let item = items
        .iter()
        .find(|candidate| candidate.id == Some(body.agenda_item_id))
        .ok_or(AppError::NotFound)?;

    let event_id = invites::create_update_item_invite(
        &pool,
        calendar.as_ref(),
        &meeting,
        item,
        body.is_create_as_new,
        body.is_already_sent,
    )
    .await?;
    Ok(HttpResponse::Ok().json(event_id))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationRequest {
    pub board_meeting_id: i64,
}

/// POST /api/invites/automation — drive every invite of a meeting to
/// "sent and current", meeting first, then items. Bounded; a stuck invite
/// surfaces as a partial-completion error instead of looping forever.
pub async fn run_automation(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    calendar: web::Data<dyn CalendarStore>,
    directory: web::Data<dyn DirectoryStore>,
    profiles: web::Data<dyn ProfileStore>,
    request: HttpRequest,
    body: web::Json<AutomationRequest>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let report = automation::run_automation(
        &pool,
        calendar.as_ref(),
        directory.as_ref(),
        profiles.as_ref(),
        &config.drives,
        &config.calendar,
        body.board_meeting_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(report))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarItemQuery {
    pub event_id: String,
}

/// GET /api/calendaritem?eventId= — the observed remote event, or `false`
/// when the remote store no longer knows it (so the client can classify the
/// invite as missing without treating that as an error).
pub async fn calendar_item(
    calendar: web::Data<dyn CalendarStore>,
    request: HttpRequest,
    query: web::Query<CalendarItemQuery>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    match calendar.fetch_event(&query.event_id).await? {
        Some(event) => {
            let start = event.start.to_utc()?;
            let end = event.end.to_utc()?;
            let location = event.location_name().to_string();
            let attendees = event.attendee_addresses();
            let join_url = event.join_url().map(str::to_string);
            Ok(HttpResponse::Ok().json(json!({
                "id": event.id,
                "subject": event.subject,
                "isDraft": event.is_draft,
                "webLink": event.web_link,
                "start": start,
                "end": end,
                "location": location,
                "attendees": attendees,
                "joinUrl": join_url,
            })))
        }
        None => Ok(HttpResponse::Ok().json(false)),
    }
}
