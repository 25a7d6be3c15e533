// src/lib.rs
pub mod assistant;
pub mod cli;
pub mod config;
pub mod database;
pub mod jobs;
pub mod labourers;
pub mod logging;
pub mod query;
pub mod recommend;
pub mod web;

use anyhow::Result;
use std::sync::Arc;

pub use assistant::{AssistantReply, JobAssistant, ReplyRoute};
pub use config::AppConfig;
pub use database::DatabaseConfig;
pub use jobs::{Job, JobFilter, JobPage, JobRepository, JobSearch, NewJob};
pub use labourers::{Labourer, LabourerRepository, NewLabourer};
pub use query::{ExtractedQuery, QueryInterpreter, Vocabulary};
pub use recommend::{JobRecommender, Recommender};
pub use web::{mount_api, start_web_server};

/// Wire the interpreter to the SQLite-backed search and recommendation collaborators.
pub fn build_assistant(db_config: &DatabaseConfig, vocabulary: Vocabulary) -> Result<JobAssistant> {
    let pool = db_config.pool()?.clone();
    let jobs = JobRepository::new(pool.clone());
    let recommender = Recommender::new(jobs.clone(), LabourerRepository::new(pool));
    let interpreter = QueryInterpreter::new(vocabulary)?;

    Ok(JobAssistant::new(
        Arc::new(interpreter),
        Arc::new(jobs),
        Arc::new(recommender),
    ))
}
