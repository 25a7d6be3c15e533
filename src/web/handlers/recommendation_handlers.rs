// src/web/handlers/recommendation_handlers.rs
use super::{database_error, not_found, pool};
use crate::database::DatabaseConfig;
use crate::jobs::JobRepository;
use crate::labourers::LabourerRepository;
use crate::recommend::{Recommender, ScoredJob, ScoredLabourer, TOP_RECOMMENDATIONS};
use crate::web::types::*;

use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

fn recommender(db_config: &DatabaseConfig) -> Result<Recommender, ApiError> {
    let pool = pool(db_config, &None)?;
    Ok(Recommender::new(
        JobRepository::new(pool.clone()),
        LabourerRepository::new(pool),
    ))
}

fn section(title: String, reason: &str, score: f64) -> DisplaySection {
    DisplaySection {
        title,
        content: reason.to_string(),
        score: Some(format!("{:.2}", score)),
        points: None,
    }
}

pub async fn job_recommendations_handler(
    labourer_id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<RecommendationData<ScoredJob>>> {
    let recommender = recommender(db_config)?;
    let labourers = LabourerRepository::new(pool(db_config, &None)?);

    match labourers.find(labourer_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(not_found(format!("Labourer {}", labourer_id), &None)),
        Err(e) => {
            error!("Failed to load labourer {}: {:#}", labourer_id, e);
            return Err(database_error(&None));
        }
    }

    let ranked = recommender
        .jobs_for_labourer(labourer_id)
        .await
        .map_err(|e| {
            error!("Job recommendations failed: {:#}", e);
            database_error(&None)
        })?;

    let total = ranked.len();
    let top: Vec<ScoredJob> = ranked.into_iter().take(TOP_RECOMMENDATIONS).collect();
    info!(
        "Recommended {} of {} jobs to labourer {}",
        top.len(),
        total,
        labourer_id
    );

    let sections = top
        .iter()
        .map(|s| section(s.job.title.clone(), &s.reason, s.match_score))
        .collect();

    Ok(Json(
        DataResponse::success(
            format!("{} job recommendations", top.len()),
            RecommendationData {
                recommendations: top,
                total,
            },
            None,
        )
        .with_display_format(DisplayFormat {
            format_type: "ranked_list".to_string(),
            sections: Some(sections),
        }),
    ))
}

pub async fn labourer_recommendations_handler(
    job_id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<RecommendationData<ScoredLabourer>>> {
    let recommender = recommender(db_config)?;
    let jobs = JobRepository::new(pool(db_config, &None)?);

    match jobs.find_job(job_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(not_found(format!("Job {}", job_id), &None)),
        Err(e) => {
            error!("Failed to load job {}: {:#}", job_id, e);
            return Err(database_error(&None));
        }
    }

    let ranked = recommender.labourers_for_job(job_id).await.map_err(|e| {
        error!("Labourer recommendations failed: {:#}", e);
        database_error(&None)
    })?;

    let total = ranked.len();
    let top: Vec<ScoredLabourer> = ranked.into_iter().take(TOP_RECOMMENDATIONS).collect();

    let sections = top
        .iter()
        .map(|s| section(s.labourer.name.clone(), &s.reason, s.match_score))
        .collect();

    Ok(Json(
        DataResponse::success(
            format!("{} labourer recommendations", top.len()),
            RecommendationData {
                recommendations: top,
                total,
            },
            None,
        )
        .with_display_format(DisplayFormat {
            format_type: "ranked_list".to_string(),
            sections: Some(sections),
        }),
    ))
}
