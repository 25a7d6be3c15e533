// src/web/handlers/application_handlers.rs
use super::{database_error, not_found, pool};
use crate::database::DatabaseConfig;
use crate::jobs::repository::Application;
use crate::jobs::JobRepository;
use crate::labourers::LabourerRepository;
use crate::web::types::*;

use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

fn application_list(applications: Vec<Application>) -> ApplicationListData {
    ApplicationListData {
        total: applications.len(),
        applications,
    }
}

pub async fn labourer_applications_handler(
    labourer_id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<ApplicationListData>> {
    let db_pool = pool(db_config, &None)?;

    match LabourerRepository::new(db_pool.clone()).find(labourer_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(not_found(format!("Labourer {}", labourer_id), &None)),
        Err(e) => {
            error!("Failed to load labourer {}: {:#}", labourer_id, e);
            return Err(database_error(&None));
        }
    }

    match JobRepository::new(db_pool).applications_by_labourer(labourer_id).await {
        Ok(applications) => Ok(Json(DataResponse::success(
            format!("{} applications", applications.len()),
            application_list(applications),
            None,
        ))),
        Err(e) => {
            error!("Failed to list applications of labourer {}: {:#}", labourer_id, e);
            Err(database_error(&None))
        }
    }
}

pub async fn job_applications_handler(
    job_id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<ApplicationListData>> {
    let repository = JobRepository::new(pool(db_config, &None)?);

    match repository.find_job(job_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(not_found(format!("Job {}", job_id), &None)),
        Err(e) => {
            error!("Failed to load job {}: {:#}", job_id, e);
            return Err(database_error(&None));
        }
    }

    match repository.applications_for_job(job_id).await {
        Ok(applications) => Ok(Json(DataResponse::success(
            format!("{} applications", applications.len()),
            application_list(applications),
            None,
        ))),
        Err(e) => {
            error!("Failed to list applications for job {}: {:#}", job_id, e);
            Err(database_error(&None))
        }
    }
}

/// Contractor decision on an application: accept, reject or reset to pending.
pub async fn update_application_status_handler(
    id: i64,
    request: Json<StandardRequest<ApplicationStatusRequest>>,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<ActionResponse<Application>> {
    let conversation_id = request.conversation_id();
    let status = request.data.status;
    let repository = JobRepository::new(pool(db_config, &conversation_id)?);

    match repository.set_application_status(id, status).await {
        Ok(Some(application)) => {
            info!("Application {} set to {}", id, status.as_str());
            Ok(Json(ActionResponse::success(
                format!("Application {} is {}", id, status.as_str()),
                "application_status_updated".to_string(),
                application,
                conversation_id,
            )))
        }
        Ok(None) => Err(not_found(format!("Application {}", id), &conversation_id)),
        Err(e) => {
            error!("Failed to update application {}: {:#}", id, e);
            Err(database_error(&conversation_id))
        }
    }
}
