use actix_web::{HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Http(reqwest::Error),
    /// Remote store answered with a non-success status.
    Graph { status: u16, message: String },
    Decode(serde_json::Error),
    /// Caller failed a precondition (missing token, missing id, bad body).
    BadRequest(String),
    NotFound,
    Config(String),
    Render(String),
    /// Bulk invite automation hit its iteration cap before convergence.
    Automation(String),
}

impl AppError {
    /// Whether this error means "the item is already gone".
    ///
    /// Best-effort cleanup paths check this predicate before swallowing an
    /// error; everything else propagates.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::NotFound | AppError::Graph { status: 404, .. }
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Http(e) => write!(f, "HTTP error: {e}"),
            AppError::Graph { status, message } => {
                write!(f, "Graph error ({status}): {message}")
            }
            AppError::Decode(e) => write!(f, "Decode error: {e}"),
            AppError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            AppError::NotFound => write!(f, "Not found"),
            AppError::Config(msg) => write!(f, "Configuration error: {msg}"),
            AppError::Render(msg) => write!(f, "Render error: {msg}"),
            AppError::Automation(msg) => write!(f, "Automation error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::BadRequest(msg) => HttpResponse::BadRequest().body(msg.clone()),
            AppError::NotFound => HttpResponse::NotFound().body("Not Found"),
            // The raw message is passed through on purpose: the user base is
            // small and trusted, and operators need the underlying cause.
            _ => {
                log::error!("{self}");
                HttpResponse::InternalServerError().body(self.to_string())
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Http(e)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Decode(e)
    }
}
