// src/web/handlers/labourer_handlers.rs
use super::{database_error, not_found, pool, validation_error};
use crate::database::DatabaseConfig;
use crate::labourers::{Labourer, LabourerRepository, NewLabourer};
use crate::web::types::*;

use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;
use tracing::error;

pub async fn create_labourer_handler(
    request: Json<StandardRequest<NewLabourer>>,
    db_config: &State<DatabaseConfig>,
) -> Result<Custom<Json<ActionResponse<Labourer>>>, ApiError> {
    let conversation_id = request.conversation_id();

    let errors = request.data.validation_errors();
    if !errors.is_empty() {
        return Err(validation_error(errors, &conversation_id));
    }

    let repository = LabourerRepository::new(pool(db_config, &conversation_id)?);

    match repository.create(&request.data).await {
        Ok(labourer) => {
            let next_actions = vec![format!(
                "Get job recommendations for labourer {}",
                labourer.id
            )];
            Ok(Custom(
                Status::Created,
                Json(
                    ActionResponse::success(
                        format!("Labourer '{}' registered", labourer.name),
                        "labourer_created".to_string(),
                        labourer,
                        conversation_id,
                    )
                    .with_next_actions(next_actions),
                ),
            ))
        }
        Err(e) => {
            error!("Failed to register labourer: {:#}", e);
            Err(database_error(&conversation_id))
        }
    }
}

pub async fn get_labourer_handler(
    id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<Labourer>> {
    let repository = LabourerRepository::new(pool(db_config, &None)?);

    match repository.find(id).await {
        Ok(Some(labourer)) => Ok(Json(DataResponse::success(
            labourer.name.clone(),
            labourer,
            None,
        ))),
        Ok(None) => Err(not_found(format!("Labourer {}", id), &None)),
        Err(e) => {
            error!("Failed to load labourer {}: {:#}", id, e);
            Err(database_error(&None))
        }
    }
}
