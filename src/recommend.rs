// src/recommend.rs
//! Weighted-sum matching between labourer profiles and job postings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::jobs::{Job, JobRepository};
use crate::labourers::{split_skills, Labourer, LabourerRepository};

pub const TOP_RECOMMENDATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub skill: f64,
    pub experience: f64,
    pub location: f64,
}

pub const JOB_FOR_LABOURER: Weights = Weights {
    skill: 0.4,
    experience: 0.2,
    location: 0.3,
};

pub const LABOURER_FOR_JOB: Weights = Weights {
    skill: 0.5,
    experience: 0.3,
    location: 0.2,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredJob {
    #[serde(flatten)]
    pub job: Job,
    pub match_score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredLabourer {
    #[serde(flatten)]
    pub labourer: Labourer,
    pub match_score: f64,
    pub reason: String,
}

/// Fraction of the job's skills that some labourer skill contains, or is contained by.
pub fn skill_match(labourer_skills: &str, job_skill: &str) -> f64 {
    let labourer = split_skills(labourer_skills);
    let job = split_skills(job_skill);
    if job.is_empty() {
        return 0.0;
    }

    let matches = job
        .iter()
        .filter(|skill| {
            labourer
                .iter()
                .any(|own| own.contains(skill.as_str()) || skill.contains(own.as_str()))
        })
        .count();

    matches as f64 / job.len() as f64
}

pub fn location_match(labourer_location: &str, job_location: &str) -> f64 {
    let own = labourer_location.trim().to_lowercase();
    let job = job_location.trim().to_lowercase();

    if own == job {
        1.0
    } else if own.contains(&job) || job.contains(&own) {
        0.8
    } else if own.split_whitespace().any(|word| job.contains(word)) {
        0.6
    } else {
        0.3
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percent(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Scores one pairing; absent profile fields contribute nothing.
pub fn score(labourer: &Labourer, job: &Job, weights: Weights) -> MatchScore {
    let mut total = 0.0;
    let mut reasons = Vec::new();

    if !labourer.skills.trim().is_empty() && !job.skill.trim().is_empty() {
        let skill = skill_match(&labourer.skills, &job.skill);
        total += skill * weights.skill;
        reasons.push(format!("Skill match: {}%", percent(skill)));
    }

    if labourer.experience > 0 {
        total += (labourer.experience as f64 / 10.0).min(1.0) * weights.experience;
        reasons.push(format!("Experience: {} years", labourer.experience));
    }

    if !labourer.location.trim().is_empty() && !job.location.trim().is_empty() {
        let location = location_match(&labourer.location, &job.location);
        total += location * weights.location;
        reasons.push(format!("Location match: {}%", percent(location)));
    }

    MatchScore {
        score: round2(total),
        reason: reasons.join(", "),
    }
}

fn by_score_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Ranks candidate jobs for a labourer, best first.
pub fn rank_jobs(labourer: &Labourer, jobs: Vec<Job>) -> Vec<ScoredJob> {
    let mut scored: Vec<ScoredJob> = jobs
        .into_iter()
        .map(|job| {
            let MatchScore { score, reason } = score(labourer, &job, JOB_FOR_LABOURER);
            ScoredJob {
                job,
                match_score: score,
                reason,
            }
        })
        .collect();
    scored.sort_by(|a, b| by_score_desc(a.match_score, b.match_score));
    scored
}

/// Ranks candidate labourers for a job, best first.
pub fn rank_labourers(job: &Job, labourers: Vec<Labourer>) -> Vec<ScoredLabourer> {
    let mut scored: Vec<ScoredLabourer> = labourers
        .into_iter()
        .map(|labourer| {
            let MatchScore { score, reason } = score(&labourer, job, LABOURER_FOR_JOB);
            ScoredLabourer {
                labourer,
                match_score: score,
                reason,
            }
        })
        .collect();
    scored.sort_by(|a, b| by_score_desc(a.match_score, b.match_score));
    scored
}

/// Recommendation source used by the assistant when an utterance yields nothing.
#[rocket::async_trait]
pub trait JobRecommender: Send + Sync {
    /// Full ranked list for the labourer; empty when the labourer is unknown.
    async fn recommend_jobs(&self, labourer_id: i64) -> Result<Vec<ScoredJob>>;
}

#[derive(Clone)]
pub struct Recommender {
    jobs: JobRepository,
    labourers: LabourerRepository,
}

impl Recommender {
    pub fn new(jobs: JobRepository, labourers: LabourerRepository) -> Self {
        Self { jobs, labourers }
    }

    pub async fn jobs_for_labourer(&self, labourer_id: i64) -> Result<Vec<ScoredJob>> {
        let Some(labourer) = self.labourers.find(labourer_id).await? else {
            return Ok(Vec::new());
        };
        let candidates = self.jobs.jobs_not_applied_by(labourer_id).await?;
        debug!(
            "Scoring {} jobs for labourer {}",
            candidates.len(),
            labourer_id
        );
        Ok(rank_jobs(&labourer, candidates))
    }

    pub async fn labourers_for_job(&self, job_id: i64) -> Result<Vec<ScoredLabourer>> {
        let Some(job) = self.jobs.find_job(job_id).await? else {
            return Ok(Vec::new());
        };
        let candidates = self.labourers.not_applied_to(job_id).await?;
        debug!("Scoring {} labourers for job {}", candidates.len(), job_id);
        Ok(rank_labourers(&job, candidates))
    }
}

#[rocket::async_trait]
impl JobRecommender for Recommender {
    async fn recommend_jobs(&self, labourer_id: i64) -> Result<Vec<ScoredJob>> {
        self.jobs_for_labourer(labourer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn labourer(skills: &str, experience: i64, location: &str) -> Labourer {
        Labourer {
            id: 1,
            name: "Ravi".to_string(),
            skills: skills.to_string(),
            experience,
            location: location.to_string(),
            created_at: Utc::now(),
        }
    }

    fn job(id: i64, skill: &str, location: &str) -> Job {
        Job {
            id,
            title: format!("Job {}", id),
            description: "Work".to_string(),
            skill: skill.to_string(),
            category: "GENERAL".to_string(),
            wage: 500.0,
            location: location.to_string(),
            duration: "1 week".to_string(),
            contractor_name: "Mehta".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_skill_match_fraction() {
        assert_eq!(skill_match("driving, cooking", "driving"), 1.0);
        assert_eq!(skill_match("driving", "driving, welding"), 0.5);
        assert_eq!(skill_match("cook", "cooking"), 1.0);
        assert_eq!(skill_match("painting", "plumbing"), 0.0);
        assert_eq!(skill_match("painting", ""), 0.0);
    }

    #[test]
    fn test_location_match_levels() {
        assert_eq!(location_match("Pune", "pune"), 1.0);
        assert_eq!(location_match("Navi Mumbai", "Mumbai"), 0.8);
        assert_eq!(location_match("Pune East", "Camp, Pune"), 0.6);
        assert_eq!(location_match("Delhi", "Chennai"), 0.3);
    }

    #[test]
    fn test_score_weights_and_reason() {
        let worker = labourer("driving", 5, "Pune");
        let result = score(&worker, &job(1, "driving", "Pune"), JOB_FOR_LABOURER);
        assert_eq!(result.score, 0.8);
        assert_eq!(
            result.reason,
            "Skill match: 100%, Experience: 5 years, Location match: 100%"
        );

        let senior = labourer("driving", 20, "Pune");
        let result = score(&senior, &job(1, "driving", "Pune"), LABOURER_FOR_JOB);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_empty_profile_scores_zero() {
        let blank = labourer("", 0, "");
        let result = score(&blank, &job(1, "driving", "Pune"), JOB_FOR_LABOURER);
        assert_eq!(result.score, 0.0);
        assert!(result.reason.is_empty());
    }

    #[test]
    fn test_rank_jobs_orders_by_score() {
        let worker = labourer("gardening", 2, "Pune");
        let ranked = rank_jobs(
            &worker,
            vec![
                job(1, "welding", "Delhi"),
                job(2, "gardening", "Pune"),
                job(3, "gardening", "Mumbai"),
            ],
        );
        let ids: Vec<i64> = ranked.iter().map(|s| s.job.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
