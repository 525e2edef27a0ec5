//! Display-name override endpoints.

use actix_web::{web, HttpRequest, HttpResponse};
use sqlx::PgPool;

use crate::auth::require_bearer;
use crate::errors::AppError;
use crate::models::user_mapping::{self, UserMapping};

/// GET /api/usermappings — all overrides, alphabetical by display name.
pub async fn list(
    pool: web::Data<PgPool>,
    request: HttpRequest,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    let mappings = user_mapping::list_all(&pool).await?;
    Ok(HttpResponse::Ok().json(mappings))
}

/// POST /api/usermappings — replace the whole override table.
pub async fn replace(
    pool: web::Data<PgPool>,
    request: HttpRequest,
    body: web::Json<Vec<UserMapping>>,
) -> Result<HttpResponse, AppError> {
    require_bearer(&request)?;
    user_mapping::replace_all(&pool, &body).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true })))
}
