use crate::memory::InMemoryRepository;
use crate::postgres::{PostgresRepository, PostgresSettings};
use linkstash_core::{Repository, Result};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Which storage engine to open.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// The in-memory engine, journaled to a file when a path is given.
    InMemory { journal_path: Option<PathBuf> },
    /// The PostgreSQL engine.
    Postgres {
        database_url: String,
        settings: PostgresSettings,
    },
}

impl StorageConfig {
    /// Picks the engine from the available settings: a database URL selects
    /// PostgreSQL, otherwise the in-memory engine is used.
    pub fn select(database_url: Option<String>, journal_path: Option<PathBuf>) -> Self {
        match database_url.filter(|url| !url.is_empty()) {
            Some(database_url) => StorageConfig::Postgres {
                database_url,
                settings: PostgresSettings::default(),
            },
            None => StorageConfig::InMemory { journal_path },
        }
    }
}

impl Display for StorageConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageConfig::InMemory { journal_path: None } => write!(f, "in-memory"),
            StorageConfig::InMemory {
                journal_path: Some(path),
            } => write!(f, "in-memory (journal: {})", path.display()),
            StorageConfig::Postgres { .. } => write!(f, "postgres"),
        }
    }
}

/// Opens the configured repository.
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn Repository>> {
    info!(storage_backend = %config, "opening repository");

    let repository: Arc<dyn Repository> = match config {
        StorageConfig::InMemory { journal_path: None } => Arc::new(InMemoryRepository::new()),
        StorageConfig::InMemory {
            journal_path: Some(path),
        } => {
            let repository = InMemoryRepository::with_journal(path)?;
            info!(links = repository.len(), path = %path.display(), "journal replayed");
            Arc::new(repository)
        }
        StorageConfig::Postgres {
            database_url,
            settings,
        } => Arc::new(PostgresRepository::connect(database_url, settings).await?),
    };

    Ok(repository)
}
