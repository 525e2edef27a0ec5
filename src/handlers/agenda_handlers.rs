//! Agenda item endpoints: listing, wholesale save, event linkage, deletion.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::require_bearer;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::files::structure;
use crate::graph::calendar::CalendarStore;
use crate::graph::drive::DirectoryStore;
use crate::models::agenda_item::{self, AgendaItem};

#[derive(Debug, Deserialize)]
pub struct AgendaItemsQuery {
    /// Meeting id; absent means "list the orphan pool".
    pub boardmeeting: Option<i64>,
}

/// GET /api/agendaitems?boardmeeting= — a meeting's items in agenda order,
/// or all orphaned items when no meeting is given.
pub async fn list(
    pool: web::Data<PgPool>,
    request: HttpRequest,
    query: web::Query<AgendaItemsQuery>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let items = match query.boardmeeting {
        Some(meeting_id) => agenda_item::find_by_meeting(&pool, meeting_id).await?,
        None => agenda_item::find_orphaned(&pool).await?,
    };
    Ok(HttpResponse::Ok().json(items))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAgendaRequest {
    pub board_meeting_id: i64,
    #[serde(default)]
    pub agenda_items: Vec<AgendaItem>,
    #[serde(default)]
    pub unassigned_agenda_items: Vec<AgendaItem>,
}

/// POST /api/agenda/save — wholesale agenda save.
///
/// Saves assigned items with a dense, zero-based order index in the order
/// the client sent them, un-assigns removed items (their invite is
/// cancelled, their folder survives in the pool), then reconciles the
/// folder tree and persists the returned folder ids.
pub async fn save(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    directory: web::Data<dyn DirectoryStore>,
    calendar: web::Data<dyn CalendarStore>,
    request: HttpRequest,
    body: web::Json<SaveAgendaRequest>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let payload = body.into_inner();
    let meeting_id = payload.board_meeting_id;

    for (index, item) in payload.agenda_items.iter().enumerate() {
        if item.is_new {
            agenda_item::insert(&pool, item, Some(meeting_id), index as i64).await?;
        } else {
            agenda_item::update(&pool, item, Some(meeting_id), index as i64).await?;
        }
    }

    for item in &payload.unassigned_agenda_items {
        let Some(id) = item.id else { continue };
        if let Some(event_id) = item.event_id.as_deref().filter(|id| !id.is_empty()) {
            match calendar.cancel_event(event_id).await {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {
                    log::info!("Invite of un-assigned item {id} already gone");
                }
                Err(err) => {
                    log::error!("Could not cancel invite of un-assigned item {id}: {err}");
                }
            }
        }
        agenda_item::unassign(&pool, id).await?;
    }

    let result = structure::ensure_file_structure(
        &pool,
        directory.as_ref(),
        &config.drives,
        meeting_id,
    )
    .await?;
    structure::persist_file_structure(&pool, meeting_id, &result).await?;

    Ok(HttpResponse::Ok().json("All agenda items assigned and updated successfully."))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetEventIdRequest {
    pub agenda_item_id: i64,
    pub event_id: String,
}

/// POST /api/agendaitems/event — persist the calendar event id of one item.
pub async fn set_event_id(
    pool: web::Data<PgPool>,
    request: HttpRequest,
    body: web::Json<SetEventIdRequest>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    agenda_item::set_event_id(&pool, body.agenda_item_id, &body.event_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAgendaItemRequest {
    pub item_id: i64,
}

/// POST /api/agendaitems/delete — remove one item for good.
///
/// This is the one path that deletes an item's folder, because the item
/// itself ceases to exist. Both remote cleanups tolerate already-gone state.
pub async fn delete(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    directory: web::Data<dyn DirectoryStore>,
    calendar: web::Data<dyn CalendarStore>,
    request: HttpRequest,
    body: web::Json<DeleteAgendaItemRequest>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let item = agenda_item::find_by_id(&pool, body.item_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let item_id = body.item_id;

    if let Some(event_id) = item.event_id.as_deref().filter(|id| !id.is_empty()) {
        match calendar.cancel_event(event_id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                log::info!("Invite of agenda item {item_id} already gone");
            }
            Err(err) => {
                log::error!("Could not cancel invite of agenda item {item_id}: {err}");
            }
        }
    }

    if let Some(folder_id) = item.file_location_id.as_deref() {
        match directory
            .delete_item(&config.drives.meetings_drive_id, folder_id)
            .await
        {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                log::info!("Folder of agenda item {item_id} already gone");
            }
            Err(err) => {
                log::error!("Could not delete folder of agenda item {item_id}: {err}");
            }
        }
    }

    agenda_item::delete(&pool, item_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true })))
}
