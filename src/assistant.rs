// src/assistant.rs
//! Chat assistant: turns an utterance into a job search, or falls back to recommendations.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::jobs::{Job, JobFilter, JobSearch};
use crate::query::{ExtractedQuery, QueryInterpreter};
use crate::recommend::JobRecommender;

pub const SEARCH_LIMIT: u32 = 10;
pub const SEARCH_CARDS: usize = 5;
pub const RECOMMENDATION_CARDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyRoute {
    Search,
    Recommendation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    pub query: ExtractedQuery,
    pub route: ReplyRoute,
    pub messages: Vec<String>,
}

#[derive(Clone)]
pub struct JobAssistant {
    interpreter: Arc<QueryInterpreter>,
    search: Arc<dyn JobSearch>,
    recommender: Arc<dyn JobRecommender>,
}

impl JobAssistant {
    pub fn new(
        interpreter: Arc<QueryInterpreter>,
        search: Arc<dyn JobSearch>,
        recommender: Arc<dyn JobRecommender>,
    ) -> Self {
        Self {
            interpreter,
            search,
            recommender,
        }
    }

    pub fn interpreter(&self) -> &QueryInterpreter {
        &self.interpreter
    }

    pub async fn respond(&self, utterance: &str, labourer_id: Option<i64>) -> AssistantReply {
        let query = self.interpreter.extract(utterance);

        if query.is_empty() {
            let messages = self.recommend(labourer_id).await;
            return AssistantReply {
                query,
                route: ReplyRoute::Recommendation,
                messages,
            };
        }

        let messages = self.search(&query).await;
        AssistantReply {
            query,
            route: ReplyRoute::Search,
            messages,
        }
    }

    async fn search(&self, query: &ExtractedQuery) -> Vec<String> {
        let mut messages = vec![status_line(query)];
        let filter = JobFilter::from_query(query, SEARCH_LIMIT);

        match self.search.find_jobs(&filter).await {
            Ok(page) if page.jobs.is_empty() => {
                messages.push(format!(
                    "Sorry, no matching jobs found for {}.",
                    search_terms(query)
                ));
            }
            Ok(page) => {
                info!(
                    "Assistant search matched {} jobs for {:?}",
                    page.total, query
                );
                messages.extend(page.jobs.iter().take(SEARCH_CARDS).map(job_card));
                if page.total > SEARCH_CARDS as i64 {
                    messages.push(format!(
                        "Found {} jobs. Showing top {}.",
                        page.total, SEARCH_CARDS
                    ));
                }
            }
            Err(e) => {
                warn!("Job search failed: {:#}", e);
                messages.push("Oops, could not fetch job results.".to_string());
            }
        }
        messages
    }

    async fn recommend(&self, labourer_id: Option<i64>) -> Vec<String> {
        let mut messages = vec!["🔍 Searching best jobs for you...".to_string()];

        let recommendations = match labourer_id {
            Some(id) => self.recommender.recommend_jobs(id).await,
            None => Ok(Vec::new()),
        };

        match recommendations {
            Ok(jobs) if jobs.is_empty() => {
                messages.push("Sorry, I couldn't find suitable jobs for you right now.".to_string());
            }
            Ok(jobs) => {
                messages.extend(
                    jobs.iter()
                        .take(RECOMMENDATION_CARDS)
                        .map(|scored| job_card(&scored.job)),
                );
                if jobs.len() > RECOMMENDATION_CARDS {
                    messages.push("Type \"more\" to see more jobs!".to_string());
                }
            }
            Err(e) => {
                warn!("Recommendation lookup failed: {:#}", e);
                messages.push(
                    "Oops, something went wrong with the recommendation service.".to_string(),
                );
            }
        }
        messages
    }
}

pub fn status_line(query: &ExtractedQuery) -> String {
    let skills = query.skills.join(" and ");
    match (query.skills.is_empty(), query.location.as_deref()) {
        (false, Some(location)) => format!("🔍 Finding {} jobs in {}...", skills, location),
        (false, None) => format!("🔍 Finding {} jobs...", skills),
        (true, Some(location)) => format!("🔍 Finding jobs in {}...", location),
        (true, None) => "🔍 Looking for jobs...".to_string(),
    }
}

fn search_terms(query: &ExtractedQuery) -> String {
    let mut terms = Vec::new();
    if !query.skills.is_empty() {
        terms.push(format!("skills: {}", query.skills.join(", ")));
    }
    if let Some(location) = &query.location {
        terms.push(format!("location: {}", location));
    }
    terms.join(", ")
}

pub fn job_card(job: &Job) -> String {
    format!(
        "⭐ {} at {} (Wage: ₹{}/day)\n{}",
        job.title,
        job.location,
        format_wage(job.wage),
        job.description
    )
}

/// Whole rupee amounts print without a decimal part.
pub fn format_wage(wage: f64) -> String {
    if wage.fract() == 0.0 && wage.abs() < 1e15 {
        format!("{}", wage as i64)
    } else {
        format!("{}", wage)
    }
}
