// src/cli.rs
use crate::config::AppConfig;
use crate::database;
use crate::jobs::{JobFilter, JobRepository, NewJob};
use crate::query::QueryInterpreter;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "labour-assist")]
#[command(about = "Job assistant for the labour marketplace")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Overrides the configured database path
    #[arg(long, global = true)]
    pub database_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Print the skills and location recognised in a sentence, as JSON
    Interpret { text: String },
    /// Manage job postings
    #[command(subcommand)]
    Jobs(JobsCommand),
}

#[derive(Subcommand)]
pub enum JobsCommand {
    /// Import jobs from a CSV file with a header row
    Import { csv_file: PathBuf },
    /// List jobs, newest first
    List {
        #[arg(long)]
        skill: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

pub async fn handle_command(cli: Cli, mut config: AppConfig) -> Result<()> {
    if let Some(path) = cli.database_path {
        config.database_path = path;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => crate::web::start_web_server(&config).await,

        Command::Interpret { text } => {
            let interpreter = QueryInterpreter::new(config.load_vocabulary()?)?;
            let query = interpreter.extract(&text);
            println!("{}", serde_json::to_string_pretty(&query)?);
            Ok(())
        }

        Command::Jobs(JobsCommand::Import { csv_file }) => {
            if !csv_file.exists() {
                anyhow::bail!("CSV file not found: {}", csv_file.display());
            }
            let db_config = database::connect(config.database_path.clone()).await?;
            let repository = JobRepository::new(db_config.pool()?.clone());

            let content = tokio::fs::read_to_string(&csv_file)
                .await
                .with_context(|| format!("Failed to read {}", csv_file.display()))?;
            let summary = import_jobs_csv(&repository, &content).await?;

            println!(
                "✅ Imported {} jobs ({} skipped) from {}",
                summary.imported,
                summary.skipped,
                csv_file.display()
            );
            Ok(())
        }

        Command::Jobs(JobsCommand::List {
            skill,
            location,
            page,
            limit,
        }) => {
            let db_config = database::connect(config.database_path.clone()).await?;
            let repository = JobRepository::new(db_config.pool()?.clone());
            let filter = JobFilter::new(skill, location, Some(page), Some(limit));
            let result = repository.find_jobs(&filter).await?;

            if result.jobs.is_empty() {
                println!("No jobs found");
                return Ok(());
            }

            println!(
                "📋 {} jobs (page {} of {}):",
                result.total,
                result.page,
                result.pages()
            );
            for job in &result.jobs {
                println!(
                    "  #{} {} | {} | {} | ₹{}/day | {}",
                    job.id,
                    job.title,
                    job.skill,
                    job.location,
                    crate::assistant::format_wage(job.wage),
                    job.contractor_name
                );
            }
            Ok(())
        }
    }
}

/// Rows that fail to parse or validate are skipped and counted.
pub async fn import_jobs_csv(repository: &JobRepository, content: &str) -> Result<ImportSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut summary = ImportSummary::default();

    for (index, result) in reader.deserialize::<NewJob>().enumerate() {
        let row = index + 2;
        let job = match result {
            Ok(job) => job,
            Err(e) => {
                warn!("⚠️  Skipping row {}: {}", row, e);
                summary.skipped += 1;
                continue;
            }
        };

        let errors = job.validation_errors();
        if !errors.is_empty() {
            warn!("⚠️  Skipping row {}: {}", row, errors.join(", "));
            summary.skipped += 1;
            continue;
        }

        repository.create_job(&job).await?;
        summary.imported += 1;
    }

    info!(
        "CSV import finished: {} imported, {} skipped",
        summary.imported, summary.skipped
    );
    Ok(summary)
}
