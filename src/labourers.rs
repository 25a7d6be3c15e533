// src/labourers.rs
//! Labourer profiles used to rank jobs and candidates.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

const LABOURER_COLUMNS: &str = "id, name, skills, experience, location, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Labourer {
    pub id: i64,
    pub name: String,
    /// Comma-separated skill list.
    pub skills: String,
    /// Years of experience.
    pub experience: i64,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

impl Labourer {
    pub fn skill_list(&self) -> Vec<String> {
        split_skills(&self.skills)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLabourer {
    pub name: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub experience: i64,
    #[serde(default)]
    pub location: String,
}

impl NewLabourer {
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("name is required".to_string());
        }
        if self.experience < 0 {
            errors.push("experience cannot be negative".to_string());
        }
        errors
    }
}

/// Lower-cased, trimmed, non-empty entries of a comma-separated list.
pub fn split_skills(skills: &str) -> Vec<String> {
    skills
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Clone)]
pub struct LabourerRepository {
    pool: SqlitePool,
}

impl LabourerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, labourer: &NewLabourer) -> Result<Labourer> {
        let errors = labourer.validation_errors();
        if !errors.is_empty() {
            anyhow::bail!("Invalid labourer: {}", errors.join(", "));
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO labourers (name, skills, experience, location, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(labourer.name.trim())
        .bind(labourer.skills.trim())
        .bind(labourer.experience)
        .bind(labourer.location.trim())
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert labourer")?;

        let created = Labourer {
            id: result.last_insert_rowid(),
            name: labourer.name.trim().to_string(),
            skills: labourer.skills.trim().to_string(),
            experience: labourer.experience,
            location: labourer.location.trim().to_string(),
            created_at: now,
        };

        info!("Registered labourer {}: {}", created.id, created.name);
        Ok(created)
    }

    pub async fn find(&self, id: i64) -> Result<Option<Labourer>> {
        let labourer = sqlx::query_as::<_, Labourer>(&format!(
            "SELECT {} FROM labourers WHERE id = ?",
            LABOURER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load labourer {}", id))?;
        Ok(labourer)
    }

    /// Labourers who have not applied to the job yet.
    pub async fn not_applied_to(&self, job_id: i64) -> Result<Vec<Labourer>> {
        let labourers = sqlx::query_as::<_, Labourer>(&format!(
            r#"
            SELECT {} FROM labourers
            WHERE id NOT IN (SELECT labourer_id FROM applications WHERE job_id = ?)
            ORDER BY id ASC
            "#,
            LABOURER_COLUMNS
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load candidate labourers")?;
        Ok(labourers)
    }
}
