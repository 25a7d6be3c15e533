// src/web/handlers/mod.rs
pub mod application_handlers;
pub mod assistant_handlers;
pub mod job_handlers;
pub mod labourer_handlers;
pub mod recommendation_handlers;
pub mod system_handlers;

pub use application_handlers::*;
pub use assistant_handlers::*;
pub use job_handlers::*;
pub use labourer_handlers::*;
pub use recommendation_handlers::*;
pub use system_handlers::*;

use crate::database::DatabaseConfig;
use crate::web::types::{ApiError, StandardErrorResponse};
use rocket::http::Status;
use sqlx::SqlitePool;
use tracing::error;

pub(crate) fn pool(
    db_config: &DatabaseConfig,
    conversation_id: &Option<String>,
) -> Result<SqlitePool, ApiError> {
    db_config.pool().cloned().map_err(|e| {
        error!("Database connection failed: {}", e);
        database_error(conversation_id)
    })
}

pub(crate) fn database_error(conversation_id: &Option<String>) -> ApiError {
    StandardErrorResponse::new(
        "Database operation failed".to_string(),
        "DATABASE_ERROR".to_string(),
        vec!["Try again in a few moments".to_string()],
        conversation_id.clone(),
    )
    .with_status(Status::InternalServerError)
}

pub(crate) fn not_found(what: String, conversation_id: &Option<String>) -> ApiError {
    StandardErrorResponse::new(
        format!("{} not found", what),
        "NOT_FOUND".to_string(),
        vec!["Check the identifier and try again".to_string()],
        conversation_id.clone(),
    )
    .with_status(Status::NotFound)
}

pub(crate) fn validation_error(errors: Vec<String>, conversation_id: &Option<String>) -> ApiError {
    StandardErrorResponse::new(
        "Request validation failed".to_string(),
        "VALIDATION_ERROR".to_string(),
        errors,
        conversation_id.clone(),
    )
    .with_status(Status::UnprocessableEntity)
}
