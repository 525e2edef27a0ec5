//! Board meeting CRUD endpoints.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::require_bearer;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::files::structure;
use crate::graph::calendar::CalendarStore;
use crate::graph::drive::DirectoryStore;
use crate::models::agenda_item;
use crate::models::board_meeting::{self, BoardMeeting};

/// GET /api/boardmeetings — all meetings, soonest first.
pub async fn list(
    pool: web::Data<PgPool>,
    request: HttpRequest,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let meetings = board_meeting::list_all(&pool).await?;
    Ok(HttpResponse::Ok().json(meetings))
}

/// POST /api/boardmeetings — create a meeting and return the stored row.
///
/// The folder tree is reconciled lazily: the first agenda save or invite
/// action triggers it, so a freshly created meeting has no folder yet.
pub async fn create(
    pool: web::Data<PgPool>,
    request: HttpRequest,
    body: web::Json<BoardMeeting>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let meeting = body.into_inner();
    meeting.validate()?;
    let created = board_meeting::insert(&pool, &meeting).await?;
    Ok(HttpResponse::Ok().json(created))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoardMeetingRequest {
    pub boardmeeting: BoardMeeting,
    /// Callers that only persist an event id skip the folder reconciliation.
    #[serde(default = "default_true")]
    pub ensure_file_structure: bool,
}

fn default_true() -> bool {
    true
}

/// POST /api/boardmeetings/update — full-field update, then (by default)
/// reconcile the folder tree and persist the returned ids.
pub async fn update(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    directory: web::Data<dyn DirectoryStore>,
    request: HttpRequest,
    body: web::Json<UpdateBoardMeetingRequest>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let payload = body.into_inner();
    let meeting = payload.boardmeeting;
    meeting.validate()?;
    let meeting_id = meeting
        .id
        .ok_or_else(|| AppError::BadRequest("Board meeting id is missing".into()))?;

    let affected = board_meeting::update(&pool, &meeting).await?;
    if affected == 0 {
        return Err(AppError::NotFound);
    }

    if payload.ensure_file_structure {
        let result = structure::ensure_file_structure(
            &pool,
            directory.as_ref(),
            &config.drives,
            meeting_id,
        )
        .await?;
        structure::persist_file_structure(&pool, meeting_id, &result).await?;
    }

    let stored = board_meeting::find_by_id(&pool, meeting_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(stored))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBoardMeetingRequest {
    pub meeting_id: i64,
}

/// POST /api/boardmeetings/delete.
///
/// Deleting a meeting never deletes agenda item content: items are
/// un-assigned and their folders relocated into the shared pool first; only
/// the meeting's own folder and row go away. Remote cleanup is best effort.
pub async fn delete(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    directory: web::Data<dyn DirectoryStore>,
    calendar: web::Data<dyn CalendarStore>,
    request: HttpRequest,
    body: web::Json<DeleteBoardMeetingRequest>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let meeting_id = body.meeting_id;
    let meeting = board_meeting::find_by_id(&pool, meeting_id)
        .await?
        .ok_or(AppError::NotFound)?;

    // Un-assign every item; cancel its invite while the event id is known.
    let items = agenda_item::find_by_meeting(&pool, meeting_id).await?;
    for item in &items {
        if let (Some(id), Some(event_id)) = (item.id, item.event_id.as_deref()) {
            if !event_id.is_empty() {
                if let Err(err) = calendar.cancel_event(event_id).await {
                    if !err.is_not_found() {
                        log::error!("Could not cancel invite of agenda item {id}: {err}");
                    }
                }
            }
        }
        if let Some(id) = item.id {
            agenda_item::unassign(&pool, id).await?;
        }
    }

    // Relocate the now-orphaned folders while the meeting row still exists.
    if let Err(err) = structure::ensure_file_structure(
        &pool,
        directory.as_ref(),
        &config.drives,
        meeting_id,
    )
    .await
    {
        log::error!("Folder relocation before deleting meeting {meeting_id} failed: {err}");
    }

    if let Some(event_id) = meeting.event_id.as_deref().filter(|id| !id.is_empty()) {
        if let Err(err) = calendar.cancel_event(event_id).await {
            if !err.is_not_found() {
                log::error!("Could not cancel invite of meeting {meeting_id}: {err}");
            }
        }
    }

    if let Some(folder_id) = meeting.file_location_id.as_deref() {
        match directory
            .delete_item(&config.drives.meetings_drive_id, folder_id)
            .await
        {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                log::info!("Meeting folder {folder_id} already gone");
            }
            Err(err) => return Err(err),
        }
    }

    board_meeting::delete(&pool, meeting_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Board meeting deleted successfully"
    })))
}
