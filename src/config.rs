// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::query::Vocabulary;

const DEFAULT_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATABASE: &str = "data/labour_assist.db";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub environment: String,
    pub address: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub vocabulary_path: Option<PathBuf>,
}

/// One environment section of `config.yaml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentSection {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub vocabulary_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub local: EnvironmentSection,
    #[serde(default)]
    pub production: EnvironmentSection,
}

impl AppConfig {
    /// Load configuration for the current environment from `config.yaml`
    /// (when present) and environment variable overrides.
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = PathBuf::from(
            std::env::var("LABOUR_ASSIST_CONFIG").unwrap_or_else(|_| "config.yaml".to_string()),
        );
        let file = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            Some(Self::parse_file(&content)?)
        } else {
            info!(
                "{} not found, using defaults and environment variables",
                config_path.display()
            );
            None
        };

        let mut config = Self::resolve(&environment, file, |key| std::env::var(key).ok())?;
        config.database_path = resolve_path(&config.database_path)?;
        if let Some(path) = &config.vocabulary_path {
            config.vocabulary_path = Some(resolve_path(path)?);
        }
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("LABOUR_ASSIST_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    pub fn parse_file(content: &str) -> Result<ConfigFile> {
        serde_yaml::from_str(content).context("Failed to parse config.yaml")
    }

    /// Merge defaults, the file section for `environment` and variable overrides.
    pub fn resolve(
        environment: &str,
        file: Option<ConfigFile>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let section = file
            .map(|f| match environment {
                "production" => f.production,
                _ => f.local,
            })
            .unwrap_or_default();

        let port = match var("ROCKET_PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("ROCKET_PORT must be a valid port number"))?,
            None => section.port.unwrap_or(DEFAULT_PORT),
        };

        Ok(Self {
            environment: environment.to_string(),
            address: var("ROCKET_ADDRESS")
                .or(section.address)
                .unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            port,
            database_path: var("DATABASE_PATH")
                .map(PathBuf::from)
                .or(section.database_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            vocabulary_path: var("VOCABULARY_PATH")
                .map(PathBuf::from)
                .or(section.vocabulary_path),
        })
    }

    /// The configured vocabulary override, or the built-in tables.
    pub fn load_vocabulary(&self) -> Result<Vocabulary> {
        match &self.vocabulary_path {
            Some(path) => {
                info!("Loading vocabulary from {}", path.display());
                Vocabulary::load(path)
            }
            None => Vocabulary::builtin(),
        }
    }
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(current_dir.join(path))
    }
}
