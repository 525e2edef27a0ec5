//! Document generation endpoints.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::require_bearer;
use crate::config::AppConfig;
use crate::docs::render::{self, DocumentRenderer};
use crate::errors::AppError;
use crate::graph::drive::DirectoryStore;
use crate::graph::profiles::ProfileStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentRequest {
    pub board_meeting_id: i64,
}

/// POST /api/documents/agenda — render the agenda overview PDFs (with
/// remarks and clean) into the meeting folder.
pub async fn agenda_pdf(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    directory: web::Data<dyn DirectoryStore>,
    profiles: web::Data<dyn ProfileStore>,
    renderer: web::Data<dyn DocumentRenderer>,
    request: HttpRequest,
    body: web::Json<GenerateDocumentRequest>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    render::generate_agenda_pdfs(
        &pool,
        directory.as_ref(),
        profiles.as_ref(),
        renderer.as_ref(),
        &config.drives,
        body.board_meeting_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true })))
}

/// POST /api/documents/protocol — render the protocol draft DOCX files.
pub async fn protocol_docx(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    directory: web::Data<dyn DirectoryStore>,
    profiles: web::Data<dyn ProfileStore>,
    renderer: web::Data<dyn DocumentRenderer>,
    request: HttpRequest,
    body: web::Json<GenerateDocumentRequest>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    render::generate_protocol_drafts(
        &pool,
        directory.as_ref(),
        profiles.as_ref(),
        renderer.as_ref(),
        &config.drives,
        body.board_meeting_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true })))
}
