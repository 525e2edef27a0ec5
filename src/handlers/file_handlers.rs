//! Folder reconciliation and folder link endpoints.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::require_bearer;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::files::structure;
use crate::graph::drive::DirectoryStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureFileStructureRequest {
    pub board_meeting_id: i64,
}

/// POST /api/filestructure — standalone reconciler run.
///
/// Returns the folder-id mapping and persists it, so a caller can re-run
/// reconciliation at any time to heal drift.
pub async fn ensure(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    directory: web::Data<dyn DirectoryStore>,
    request: HttpRequest,
    body: web::Json<EnsureFileStructureRequest>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let meeting_id = body.board_meeting_id;
    let result = structure::ensure_file_structure(
        &pool,
        directory.as_ref(),
        &config.drives,
        meeting_id,
    )
    .await?;
    structure::persist_file_structure(&pool, meeting_id, &result).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderLinkQuery {
    pub drive_name: String,
    pub file_location_id: String,
}

/// GET /api/folderlink?driveName=&fileLocationId= — the web URL of a folder.
pub async fn folder_link(
    config: web::Data<AppConfig>,
    directory: web::Data<dyn DirectoryStore>,
    request: HttpRequest,
    query: web::Query<FolderLinkQuery>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let drive_id = match query.drive_name.as_str() {
        "Meetings" => &config.drives.meetings_drive_id,
        "Assets" => &config.drives.assets_drive_id,
        other => {
            return Err(AppError::BadRequest(format!("Unknown driveName: {other}")));
        }
    };
    let url = directory
        .get_link(drive_id, &query.file_location_id)
        .await?;
    Ok(HttpResponse::Ok().content_type("text/plain").body(url))
}
