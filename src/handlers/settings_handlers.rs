//! Static pick lists for the client.

use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::require_bearer;
use crate::config::AppConfig;
use crate::errors::AppError;

/// GET /api/rooms
pub async fn rooms(
    config: web::Data<AppConfig>,
    request: HttpRequest,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    Ok(HttpResponse::Ok().json(&config.defaults.rooms))
}

/// GET /api/participantgroups
pub async fn participant_groups(
    config: web::Data<AppConfig>,
    request: HttpRequest,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    Ok(HttpResponse::Ok().json(&config.defaults.participant_groups))
}
