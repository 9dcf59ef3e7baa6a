use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const FILE_STORAGE_PATH_ENV: &str = "LINKSTASH_FILE_STORAGE_PATH";
pub const DATABASE_DSN_ENV: &str = "LINKSTASH_DATABASE_DSN";
pub const BASE_URL_ENV: &str = "LINKSTASH_BASE_URL";
pub const SHORTEN_BATCH_SIZE_ENV: &str = "LINKSTASH_SHORTEN_BATCH_SIZE";
pub const URL_ID_LENGTH_ENV: &str = "LINKSTASH_URL_ID_LENGTH";
pub const DELETE_WORKERS_ENV: &str = "LINKSTASH_DELETE_WORKERS";
pub const BACKEND_TIMEOUT_ENV: &str = "LINKSTASH_BACKEND_TIMEOUT";
pub const LOG_FORMAT_ENV: &str = "LINKSTASH_LOG_FORMAT";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_SHORTEN_BATCH_SIZE: usize = 100;
pub const DEFAULT_URL_ID_LENGTH: usize = 10;
pub const DEFAULT_DELETE_WORKERS: usize = 5;
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "linkstash", about = "Shorten, expand and manage short links")]
pub struct CLI {
    /// Journal file for the in-memory store. Ignored when a database DSN is set.
    #[arg(long, env = FILE_STORAGE_PATH_ENV)]
    pub file_storage_path: Option<PathBuf>,

    /// PostgreSQL connection string. Selects the PostgreSQL store when set.
    #[arg(long, env = DATABASE_DSN_ENV)]
    pub database_dsn: Option<String>,

    /// Prefix for printed short URLs.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = SHORTEN_BATCH_SIZE_ENV, default_value_t = DEFAULT_SHORTEN_BATCH_SIZE)]
    pub shorten_batch_size: usize,

    #[arg(long, env = URL_ID_LENGTH_ENV, default_value_t = DEFAULT_URL_ID_LENGTH)]
    pub url_id_length: usize,

    #[arg(long, env = DELETE_WORKERS_ENV, default_value_t = DEFAULT_DELETE_WORKERS)]
    pub delete_workers: usize,

    /// Seconds allowed for a single storage call.
    #[arg(long, env = BACKEND_TIMEOUT_ENV, default_value_t = DEFAULT_BACKEND_TIMEOUT_SECS)]
    pub backend_timeout: u64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shorten a single URL.
    Shorten {
        #[arg(long)]
        owner: String,
        url: String,
    },
    /// Shorten several URLs in one bulk write.
    Batch {
        #[arg(long)]
        owner: String,
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Print the original URL behind a short id.
    Expand { id: String },
    /// List an owner's links as JSON.
    List {
        #[arg(long)]
        owner: String,
    },
    /// Delete an owner's links.
    Delete {
        #[arg(long)]
        owner: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Check that the store is reachable.
    Ping,
}
