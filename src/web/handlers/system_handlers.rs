// src/web/handlers/system_handlers.rs
use crate::database::DatabaseConfig;
use crate::web::types::*;

use rocket::serde::json::Json;
use rocket::State;
use tracing::{info, warn};

pub async fn health_handler(db_config: &State<DatabaseConfig>) -> Json<DataResponse<HealthData>> {
    let database = match db_config.health_check().await {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            warn!("Health check could not reach the database: {:#}", e);
            "unavailable".to_string()
        }
    };
    info!("Health check (database: {})", database);

    let status = if database == "ok" { "OK" } else { "DEGRADED" };
    Json(DataResponse::success(
        status.to_string(),
        HealthData {
            status: status.to_string(),
            database,
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        None,
    ))
}
