// src/web/handlers/job_handlers.rs
use super::{database_error, not_found, pool, validation_error};
use crate::assistant::JobAssistant;
use crate::database::DatabaseConfig;
use crate::jobs::repository::{Application, ApplyOutcome};
use crate::jobs::{Job, JobFilter, JobRepository, MarketInsights, NewJob};
use crate::web::types::*;

use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

pub async fn list_jobs_handler(
    filter: JobFilter,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<JobListData>> {
    let repository = JobRepository::new(pool(db_config, &None)?);

    match repository.find_jobs(&filter).await {
        Ok(page) => Ok(Json(DataResponse::success(
            format!("{} jobs found", page.total),
            JobListData::from_page(page, None),
            None,
        ))),
        Err(e) => {
            error!("Job listing failed: {:#}", e);
            Err(database_error(&None))
        }
    }
}

/// Search box: free text goes through the interpreter before hitting the store.
pub async fn search_jobs_handler(
    q: String,
    page: Option<u32>,
    limit: Option<u32>,
    assistant: &State<JobAssistant>,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<JobListData>> {
    let query = assistant.interpreter().extract(&q);
    let filter = JobFilter::new(query.skill_filter(), query.location.clone(), page, limit);
    let repository = JobRepository::new(pool(db_config, &None)?);

    info!("Search box {:?} -> {:?}", q, filter);

    match repository.find_jobs(&filter).await {
        Ok(page) => Ok(Json(DataResponse::success(
            format!("{} jobs found", page.total),
            JobListData::from_page(page, Some(query)),
            None,
        ))),
        Err(e) => {
            error!("Job search failed: {:#}", e);
            Err(database_error(&None))
        }
    }
}

pub async fn insights_handler(
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<MarketInsights>> {
    let repository = JobRepository::new(pool(db_config, &None)?);

    match repository.market_insights().await {
        Ok(insights) => Ok(Json(DataResponse::success(
            format!(
                "{} jobs, average wage ₹{}/day",
                insights.total_jobs, insights.average_wage
            ),
            insights,
            None,
        ))),
        Err(e) => {
            error!("Market insights failed: {:#}", e);
            Err(database_error(&None))
        }
    }
}

pub async fn get_job_handler(
    id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<Job>> {
    let repository = JobRepository::new(pool(db_config, &None)?);

    match repository.find_job(id).await {
        Ok(Some(job)) => Ok(Json(DataResponse::success(
            job.title.clone(),
            job,
            None,
        ))),
        Ok(None) => Err(not_found(format!("Job {}", id), &None)),
        Err(e) => {
            error!("Failed to load job {}: {:#}", id, e);
            Err(database_error(&None))
        }
    }
}

pub async fn create_job_handler(
    request: Json<StandardRequest<NewJob>>,
    db_config: &State<DatabaseConfig>,
) -> Result<Custom<Json<ActionResponse<Job>>>, ApiError> {
    let conversation_id = request.conversation_id();

    let errors = request.data.validation_errors();
    if !errors.is_empty() {
        return Err(validation_error(errors, &conversation_id));
    }

    let repository = JobRepository::new(pool(db_config, &conversation_id)?);

    match repository.create_job(&request.data).await {
        Ok(job) => {
            let next_actions = vec![
                format!("View recommended labourers for job {}", job.id),
                "Check market insights".to_string(),
            ];
            Ok(Custom(
                Status::Created,
                Json(
                    ActionResponse::success(
                        format!("Job '{}' posted", job.title),
                        "job_created".to_string(),
                        job,
                        conversation_id,
                    )
                    .with_next_actions(next_actions),
                ),
            ))
        }
        Err(e) => {
            error!("Failed to create job: {:#}", e);
            Err(database_error(&conversation_id))
        }
    }
}

pub async fn apply_handler(
    id: i64,
    request: Json<StandardRequest<ApplyRequest>>,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<ActionResponse<Application>> {
    let conversation_id = request.conversation_id();
    let labourer_id = request.data.labourer_id;
    let repository = JobRepository::new(pool(db_config, &conversation_id)?);

    match repository.apply(id, labourer_id).await {
        Ok(ApplyOutcome::Applied(application)) => Ok(Json(ActionResponse::success(
            format!("Labourer {} applied to job {}", labourer_id, id),
            "applied".to_string(),
            application,
            conversation_id,
        ))),
        Ok(ApplyOutcome::AlreadyApplied) => Err(StandardErrorResponse::new(
            format!("Labourer {} already applied to job {}", labourer_id, id),
            "ALREADY_APPLIED".to_string(),
            vec!["Browse other recommended jobs".to_string()],
            conversation_id,
        )
        .with_status(Status::Conflict)),
        Ok(ApplyOutcome::JobNotFound) => Err(not_found(format!("Job {}", id), &conversation_id)),
        Ok(ApplyOutcome::LabourerNotFound) => Err(not_found(
            format!("Labourer {}", labourer_id),
            &conversation_id,
        )),
        Err(e) => {
            error!("Failed to apply to job {}: {:#}", id, e);
            Err(database_error(&conversation_id))
        }
    }
}

pub async fn update_job_handler(
    id: i64,
    request: Json<StandardRequest<NewJob>>,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<ActionResponse<Job>> {
    let conversation_id = request.conversation_id();

    let errors = request.data.validation_errors();
    if !errors.is_empty() {
        return Err(validation_error(errors, &conversation_id));
    }

    let repository = JobRepository::new(pool(db_config, &conversation_id)?);

    match repository.update_job(id, &request.data).await {
        Ok(Some(job)) => Ok(Json(ActionResponse::success(
            format!("Job '{}' updated", job.title),
            "job_updated".to_string(),
            job,
            conversation_id,
        ))),
        Ok(None) => Err(not_found(format!("Job {}", id), &conversation_id)),
        Err(e) => {
            error!("Failed to update job {}: {:#}", id, e);
            Err(database_error(&conversation_id))
        }
    }
}

pub async fn delete_job_handler(
    id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<ActionResponse<Job>> {
    let repository = JobRepository::new(pool(db_config, &None)?);

    match repository.delete_job(id).await {
        Ok(Some(job)) => Ok(Json(ActionResponse::success(
            format!("Job '{}' deleted", job.title),
            "job_deleted".to_string(),
            job,
            None,
        ))),
        Ok(None) => Err(not_found(format!("Job {}", id), &None)),
        Err(e) => {
            error!("Failed to delete job {}: {:#}", id, e);
            Err(database_error(&None))
        }
    }
}
