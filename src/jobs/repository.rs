// src/jobs/repository.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use super::{search_key, Job, JobFilter, JobPage, JobSearch, MarketInsights, NewJob};

const JOB_COLUMNS: &str = "id, title, description, skill, category, wage, location, duration, contractor_name, created_at";
const APPLICATION_COLUMNS: &str = "id, job_id, labourer_id, status, created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        match value.as_str() {
            "PENDING" => Ok(ApplicationStatus::Pending),
            "ACCEPTED" => Ok(ApplicationStatus::Accepted),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            other => anyhow::bail!("Unknown application status: {}", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub labourer_id: i64,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    Applied(Application),
    AlreadyApplied,
    JobNotFound,
    LabourerNotFound,
}

#[derive(Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_job(&self, job: &NewJob) -> Result<Job> {
        let errors = job.validation_errors();
        if !errors.is_empty() {
            anyhow::bail!("Invalid job: {}", errors.join(", "));
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO jobs (title, description, skill, category, wage, location, duration, contractor_name,
                              skill_search, location_search, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(job.title.trim())
        .bind(job.description.trim())
        .bind(job.skill.trim())
        .bind(job.category.trim())
        .bind(job.wage)
        .bind(job.location.trim())
        .bind(job.duration.trim())
        .bind(job.contractor_name.trim())
        .bind(search_key(&job.skill))
        .bind(search_key(&job.location))
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert job")?;

        let created = trimmed_job(result.last_insert_rowid(), job, now);
        info!(
            "Created job {}: {} in {}",
            created.id, created.title, created.location
        );
        Ok(created)
    }

    pub async fn find_job(&self, id: i64) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = ?", JOB_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to load job {}", id))?;
        Ok(job)
    }

    /// Replace every posted field of a job. `None` when the job does not exist.
    pub async fn update_job(&self, id: i64, job: &NewJob) -> Result<Option<Job>> {
        let errors = job.validation_errors();
        if !errors.is_empty() {
            anyhow::bail!("Invalid job: {}", errors.join(", "));
        }

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET title = ?, description = ?, skill = ?, category = ?, wage = ?, location = ?,
                duration = ?, contractor_name = ?, skill_search = ?, location_search = ?
            WHERE id = ?
            "#,
        )
        .bind(job.title.trim())
        .bind(job.description.trim())
        .bind(job.skill.trim())
        .bind(job.category.trim())
        .bind(job.wage)
        .bind(job.location.trim())
        .bind(job.duration.trim())
        .bind(job.contractor_name.trim())
        .bind(search_key(&job.skill))
        .bind(search_key(&job.location))
        .bind(id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to update job {}", id))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!("Updated job {}", id);
        self.find_job(id).await
    }

    /// Delete a job together with its applications. Returns the removed job.
    pub async fn delete_job(&self, id: i64) -> Result<Option<Job>> {
        let Some(job) = self.find_job(id).await? else {
            return Ok(None);
        };

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        sqlx::query("DELETE FROM applications WHERE job_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to delete applications of job {}", id))?;
        sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to delete job {}", id))?;
        tx.commit().await.context("Failed to commit job deletion")?;

        info!("Deleted job {}: {}", id, job.title);
        Ok(Some(job))
    }

    pub async fn find_jobs(&self, filter: &JobFilter) -> Result<JobPage> {
        let skills = filter.skill_terms();
        let location = filter
            .location
            .as_deref()
            .map(search_key)
            .filter(|l| !l.is_empty());

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM jobs");
        push_filter(&mut count_query, &skills, location.as_deref());
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count jobs")?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM jobs", JOB_COLUMNS));
        push_filter(&mut select, &skills, location.as_deref());
        select.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        select.push_bind(i64::from(filter.limit));
        select.push(" OFFSET ");
        select.push_bind(filter.offset());

        let jobs = select
            .build_query_as::<Job>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to search jobs")?;

        debug!(
            "Job search skills={:?} location={:?} page={} -> {} of {}",
            skills,
            location,
            filter.page,
            jobs.len(),
            total
        );

        Ok(JobPage {
            jobs,
            total,
            page: filter.page,
            limit: filter.limit,
        })
    }

    pub async fn market_insights(&self) -> Result<MarketInsights> {
        let (total_jobs, average_wage): (i64, Option<f64>) =
            sqlx::query_as("SELECT COUNT(*), AVG(wage) FROM jobs")
                .fetch_one(&self.pool)
                .await
                .context("Failed to aggregate job wages")?;

        let popular: Option<(String, i64)> = sqlx::query_as(
            r#"
            SELECT category, COUNT(*) AS category_count
            FROM jobs
            GROUP BY category
            ORDER BY category_count DESC, category ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to aggregate job categories")?;

        let (most_popular_category, category_count) =
            popular.unwrap_or_else(|| ("General".to_string(), 0));

        Ok(MarketInsights {
            total_jobs,
            average_wage: average_wage.unwrap_or(0.0).round() as i64,
            most_popular_category,
            category_count,
        })
    }

    /// Record a pending application. The unique (job, labourer) pair decides
    /// duplicates, so concurrent attempts cannot both succeed.
    pub async fn apply(&self, job_id: i64, labourer_id: i64) -> Result<ApplyOutcome> {
        if self.find_job(job_id).await?.is_none() {
            return Ok(ApplyOutcome::JobNotFound);
        }

        let labourer: Option<i64> = sqlx::query_scalar("SELECT id FROM labourers WHERE id = ?")
            .bind(labourer_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up labourer")?;
        if labourer.is_none() {
            return Ok(ApplyOutcome::LabourerNotFound);
        }

        let now = Utc::now();
        let status = ApplicationStatus::Pending;
        let result = sqlx::query(
            r#"
            INSERT INTO applications (job_id, labourer_id, status, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (job_id, labourer_id) DO NOTHING
            "#,
        )
        .bind(job_id)
        .bind(labourer_id)
        .bind(status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to record application")?;

        if result.rows_affected() == 0 {
            debug!("Labourer {} already applied to job {}", labourer_id, job_id);
            return Ok(ApplyOutcome::AlreadyApplied);
        }

        info!("Labourer {} applied to job {}", labourer_id, job_id);
        Ok(ApplyOutcome::Applied(Application {
            id: result.last_insert_rowid(),
            job_id,
            labourer_id,
            status,
            created_at: now,
        }))
    }

    /// Applications a labourer has made, newest first.
    pub async fn applications_by_labourer(&self, labourer_id: i64) -> Result<Vec<Application>> {
        let applications = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE labourer_id = ? ORDER BY id DESC",
            APPLICATION_COLUMNS
        ))
        .bind(labourer_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load applications of labourer {}", labourer_id))?;
        Ok(applications)
    }

    /// Applications received for a job, newest first.
    pub async fn applications_for_job(&self, job_id: i64) -> Result<Vec<Application>> {
        let applications = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE job_id = ? ORDER BY id DESC",
            APPLICATION_COLUMNS
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load applications for job {}", job_id))?;
        Ok(applications)
    }

    pub async fn set_application_status(
        &self,
        application_id: i64,
        status: ApplicationStatus,
    ) -> Result<Option<Application>> {
        let result = sqlx::query("UPDATE applications SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(application_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update application {}", application_id))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!("Application {} is now {}", application_id, status.as_str());

        let application = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE id = ?",
            APPLICATION_COLUMNS
        ))
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load application {}", application_id))?;
        Ok(application)
    }

    /// Every job the labourer has not applied to yet, newest first.
    pub async fn jobs_not_applied_by(&self, labourer_id: i64) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {} FROM jobs
            WHERE id NOT IN (SELECT job_id FROM applications WHERE labourer_id = ?)
            ORDER BY created_at DESC, id DESC
            "#,
            JOB_COLUMNS
        ))
        .bind(labourer_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load candidate jobs")?;
        Ok(jobs)
    }
}

fn trimmed_job(id: i64, job: &NewJob, created_at: DateTime<Utc>) -> Job {
    Job {
        id,
        title: job.title.trim().to_string(),
        description: job.description.trim().to_string(),
        skill: job.skill.trim().to_string(),
        category: job.category.trim().to_string(),
        wage: job.wage,
        location: job.location.trim().to_string(),
        duration: job.duration.trim().to_string(),
        contractor_name: job.contractor_name.trim().to_string(),
        created_at,
    }
}

/// Matches against the `*_search` columns, which hold the same folding as
/// `search_key`, so non-ASCII text compares case-insensitively.
fn push_filter<'a>(builder: &mut QueryBuilder<'a, Sqlite>, skills: &'a [String], location: Option<&'a str>) {
    let mut has_where = false;

    if !skills.is_empty() {
        builder.push(" WHERE (");
        for (i, skill) in skills.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push("instr(skill_search, ");
            builder.push_bind(skill.as_str());
            builder.push(") > 0");
        }
        builder.push(")");
        has_where = true;
    }

    if let Some(location) = location {
        builder.push(if has_where { " AND " } else { " WHERE " });
        builder.push("instr(location_search, ");
        builder.push_bind(location);
        builder.push(") > 0");
    }
}

#[rocket::async_trait]
impl JobSearch for JobRepository {
    async fn find_jobs(&self, filter: &JobFilter) -> Result<JobPage> {
        JobRepository::find_jobs(self, filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;
    use crate::labourers::{LabourerRepository, NewLabourer};
    use tempfile::TempDir;

    async fn repository() -> (TempDir, JobRepository) {
        let dir = TempDir::new().unwrap();
        let db = database::connect(dir.path().join("jobs.db")).await.unwrap();
        let pool = db.pool().unwrap().clone();
        (dir, JobRepository::new(pool))
    }

    fn job(title: &str, skill: &str, category: &str, wage: f64, location: &str) -> NewJob {
        NewJob {
            title: title.to_string(),
            description: format!("{} wanted", title),
            skill: skill.to_string(),
            category: category.to_string(),
            wage,
            location: location.to_string(),
            duration: "2 weeks".to_string(),
            contractor_name: "Patil Contractors".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_job() {
        let (_dir, repo) = repository().await;
        let created = repo
            .create_job(&job("Site driver", "driving", "TRANSPORT", 700.0, "Pune"))
            .await
            .unwrap();

        let found = repo.find_job(created.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Site driver");
        assert_eq!(found.location, "Pune");
        assert!(repo.find_job(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_job_rejects_invalid_wage() {
        let (_dir, repo) = repository().await;
        let result = repo
            .create_job(&job("Free work", "cleaning", "DOMESTIC", 0.0, "Delhi"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_find_jobs_filters() {
        let (_dir, repo) = repository().await;
        repo.create_job(&job("Driver", "driving", "TRANSPORT", 700.0, "Pune"))
            .await
            .unwrap();
        repo.create_job(&job("Gardener", "gardening", "OUTDOOR", 500.0, "Pune"))
            .await
            .unwrap();
        repo.create_job(&job("Courier", "delivery, driving", "TRANSPORT", 650.0, "Mumbai"))
            .await
            .unwrap();

        let all = repo.find_jobs(&JobFilter::default()).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.jobs[0].title, "Courier");

        let driving = repo
            .find_jobs(&JobFilter::new(Some("Driving".into()), None, None, None))
            .await
            .unwrap();
        assert_eq!(driving.total, 2);

        let either = repo
            .find_jobs(&JobFilter::new(Some("gardening,delivery".into()), None, None, None))
            .await
            .unwrap();
        assert_eq!(either.total, 2);

        let in_pune = repo
            .find_jobs(&JobFilter::new(Some("driving".into()), Some("pune".into()), None, None))
            .await
            .unwrap();
        assert_eq!(in_pune.total, 1);
        assert_eq!(in_pune.jobs[0].title, "Driver");

        let paged = repo
            .find_jobs(&JobFilter::new(None, None, Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(paged.total, 3);
        assert_eq!(paged.jobs.len(), 1);
        assert_eq!(paged.jobs[0].title, "Driver");
    }

    #[tokio::test]
    async fn test_market_insights() {
        let (_dir, repo) = repository().await;
        let empty = repo.market_insights().await.unwrap();
        assert_eq!(empty.total_jobs, 0);
        assert_eq!(empty.most_popular_category, "General");

        repo.create_job(&job("Driver", "driving", "TRANSPORT", 700.0, "Pune"))
            .await
            .unwrap();
        repo.create_job(&job("Courier", "delivery", "TRANSPORT", 601.0, "Pune"))
            .await
            .unwrap();
        repo.create_job(&job("Gardener", "gardening", "OUTDOOR", 500.0, "Pune"))
            .await
            .unwrap();

        let insights = repo.market_insights().await.unwrap();
        assert_eq!(insights.total_jobs, 3);
        assert_eq!(insights.average_wage, 600);
        assert_eq!(insights.most_popular_category, "TRANSPORT");
        assert_eq!(insights.category_count, 2);
    }

    async fn labourer(repo: &JobRepository, name: &str) -> crate::labourers::Labourer {
        LabourerRepository::new(repo.pool.clone())
            .create(&NewLabourer {
                name: name.to_string(),
                skills: "driving".to_string(),
                experience: 4,
                location: "Pune".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_apply_once() {
        let (_dir, repo) = repository().await;
        let worker = labourer(&repo, "Ravi").await;
        let posted = repo
            .create_job(&job("Driver", "driving", "TRANSPORT", 700.0, "Pune"))
            .await
            .unwrap();

        assert!(matches!(
            repo.apply(posted.id, worker.id).await.unwrap(),
            ApplyOutcome::Applied(_)
        ));
        assert!(matches!(
            repo.apply(posted.id, worker.id).await.unwrap(),
            ApplyOutcome::AlreadyApplied
        ));
        assert!(matches!(
            repo.apply(posted.id + 1, worker.id).await.unwrap(),
            ApplyOutcome::JobNotFound
        ));
        assert!(matches!(
            repo.apply(posted.id, worker.id + 1).await.unwrap(),
            ApplyOutcome::LabourerNotFound
        ));

        assert!(repo.jobs_not_applied_by(worker.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filters_fold_non_ascii_case() {
        let (_dir, repo) = repository().await;
        repo.create_job(&job("Kaynakçı", "Kaynak", "INDUSTRY", 900.0, "Ünye"))
            .await
            .unwrap();
        repo.create_job(&job("Driver", "driving", "TRANSPORT", 700.0, "Pune"))
            .await
            .unwrap();

        let lower = repo
            .find_jobs(&JobFilter::new(None, Some("ünye".into()), None, None))
            .await
            .unwrap();
        assert_eq!(lower.total, 1);
        assert_eq!(lower.jobs[0].location, "Ünye");

        let upper = repo
            .find_jobs(&JobFilter::new(Some("KAYNAK".into()), Some("ÜNYE".into()), None, None))
            .await
            .unwrap();
        assert_eq!(upper.total, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_applications_record_one() {
        let (_dir, repo) = repository().await;
        let worker = labourer(&repo, "Asha").await;

        for round in 0..20 {
            let posted = repo
                .create_job(&job(&format!("Driver {}", round), "driving", "TRANSPORT", 700.0, "Pune"))
                .await
                .unwrap();
            let (first, second) = tokio::join!(
                repo.apply(posted.id, worker.id),
                repo.apply(posted.id, worker.id)
            );
            let outcomes = [first.unwrap(), second.unwrap()];

            let applied = outcomes
                .iter()
                .filter(|o| matches!(o, ApplyOutcome::Applied(_)))
                .count();
            let duplicates = outcomes
                .iter()
                .filter(|o| matches!(o, ApplyOutcome::AlreadyApplied))
                .count();
            assert_eq!((applied, duplicates), (1, 1), "round {}", round);
        }

        assert_eq!(repo.applications_by_labourer(worker.id).await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_application_status_lifecycle() {
        let (_dir, repo) = repository().await;
        let worker = labourer(&repo, "Meena").await;
        let posted = repo
            .create_job(&job("Driver", "driving", "TRANSPORT", 700.0, "Pune"))
            .await
            .unwrap();

        let ApplyOutcome::Applied(application) = repo.apply(posted.id, worker.id).await.unwrap() else {
            panic!("expected a new application");
        };
        assert_eq!(application.status, ApplicationStatus::Pending);

        let accepted = repo
            .set_application_status(application.id, ApplicationStatus::Accepted)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(accepted.status, ApplicationStatus::Accepted);

        let mine = repo.applications_by_labourer(worker.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].status, ApplicationStatus::Accepted);

        let received = repo.applications_for_job(posted.id).await.unwrap();
        assert_eq!(received[0].labourer_id, worker.id);

        assert!(repo
            .set_application_status(application.id + 1, ApplicationStatus::Rejected)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_job() {
        let (_dir, repo) = repository().await;
        let worker = labourer(&repo, "Kiran").await;
        let posted = repo
            .create_job(&job("Driver", "driving", "TRANSPORT", 700.0, "Pune"))
            .await
            .unwrap();
        repo.apply(posted.id, worker.id).await.unwrap();

        let updated = repo
            .update_job(posted.id, &job("Night driver", "driving", "TRANSPORT", 850.0, "Nashik"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Night driver");
        assert_eq!(updated.wage, 850.0);

        let moved = repo
            .find_jobs(&JobFilter::new(None, Some("nashik".into()), None, None))
            .await
            .unwrap();
        assert_eq!(moved.total, 1);

        assert!(repo
            .update_job(posted.id + 10, &job("Ghost", "driving", "TRANSPORT", 500.0, "Pune"))
            .await
            .unwrap()
            .is_none());
        assert!(repo
            .update_job(posted.id, &job("Free", "driving", "TRANSPORT", 0.0, "Pune"))
            .await
            .is_err());

        let deleted = repo.delete_job(posted.id).await.unwrap().unwrap();
        assert_eq!(deleted.id, posted.id);
        assert!(repo.find_job(posted.id).await.unwrap().is_none());
        assert!(repo.applications_by_labourer(worker.id).await.unwrap().is_empty());
        assert!(repo.delete_job(posted.id).await.unwrap().is_none());
    }
}
