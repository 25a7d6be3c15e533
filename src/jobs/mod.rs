// src/jobs/mod.rs
//! Job postings and the find-jobs-by-filter collaborator.

use crate::query::ExtractedQuery;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod repository;

pub use repository::JobRepository;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub skill: String,
    pub category: String,
    pub wage: f64,
    pub location: String,
    pub duration: String,
    pub contractor_name: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to post a job. Also the row shape for CSV import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub skill: String,
    pub category: String,
    pub wage: f64,
    pub location: String,
    pub duration: String,
    pub contractor_name: String,
}

impl NewJob {
    /// Names of required fields that are blank, plus a wage check.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors: Vec<String> = [
            ("title", &self.title),
            ("description", &self.description),
            ("skill", &self.skill),
            ("category", &self.category),
            ("location", &self.location),
            ("duration", &self.duration),
            ("contractor_name", &self.contractor_name),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| format!("{} is required", field))
        .collect();

        if !(self.wage.is_finite() && self.wage > 0.0) {
            errors.push("wage must be a positive number".to_string());
        }
        errors
    }
}

/// Filter accepted by the job search: contains-matching per field, ANDed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFilter {
    /// Comma-separated skills; a job matches if any one is contained in its skill.
    pub skill: Option<String>,
    pub location: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            skill: None,
            location: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl JobFilter {
    pub fn new(
        skill: Option<String>,
        location: Option<String>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Self {
        let clean = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            skill: clean(skill),
            location: clean(location),
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Filter built from an interpreted utterance.
    pub fn from_query(query: &ExtractedQuery, limit: u32) -> Self {
        Self::new(query.skill_filter(), query.location.clone(), None, Some(limit))
    }

    /// Lower-cased skill terms split out of the comma-separated filter.
    pub fn skill_terms(&self) -> Vec<String> {
        self.skill
            .as_deref()
            .map(|skills| {
                skills
                    .split(',')
                    .map(search_key)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

/// Case folding shared by stored search columns and filter terms.
pub fn search_key(value: &str) -> String {
    value.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPage {
    pub jobs: Vec<Job>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl JobPage {
    pub fn pages(&self) -> i64 {
        if self.limit == 0 {
            return 0;
        }
        let limit = i64::from(self.limit);
        (self.total + limit - 1) / limit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInsights {
    pub total_jobs: i64,
    pub average_wage: i64,
    pub most_popular_category: String,
    pub category_count: i64,
}

/// The find-jobs-by-filter operation the assistant and search box call.
#[rocket::async_trait]
pub trait JobSearch: Send + Sync {
    async fn find_jobs(&self, filter: &JobFilter) -> Result<JobPage>;
}
