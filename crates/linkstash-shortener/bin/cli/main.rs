mod cli;

use crate::cli::{Command, LogFormat, CLI};
use anyhow::Context;
use clap::Parser;
use linkstash_core::Repository;
use linkstash_generator::RandomStringGenerator;
use linkstash_shortener::{
    short_url, BatchItem, PipelineSettings, ServiceSettings, Shortener, ShortenerService,
};
use linkstash_storage::StorageConfig;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

type Service = ShortenerService<dyn Repository, RandomStringGenerator>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::try_parse()?;
    init_tracing(config.log_format);

    let backend_timeout = Duration::from_secs(config.backend_timeout);
    let mut storage = StorageConfig::select(
        config.database_dsn.clone(),
        config.file_storage_path.clone(),
    );
    if let StorageConfig::Postgres { settings, .. } = &mut storage {
        settings.acquire_timeout = backend_timeout;
        settings.bootstrap_timeout = backend_timeout;
    }

    info!(
        storage_backend = %storage,
        batch_size = config.shorten_batch_size,
        delete_workers = config.delete_workers,
        "starting linkstash"
    );

    let repository = linkstash_storage::open(&storage)
        .await
        .context("failed to open repository")?;
    let settings = ServiceSettings::builder()
        .batch_size(config.shorten_batch_size)
        .backend_timeout(backend_timeout)
        .pipeline(
            PipelineSettings::builder()
                .workers(config.delete_workers)
                .request_timeout(backend_timeout)
                .build(),
        )
        .build();
    let service = ShortenerService::new(
        repository,
        RandomStringGenerator::new(config.url_id_length),
        settings,
    );

    let outcome = run(&service, &config.base_url, config.command).await;
    service.close().await;
    outcome
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn run(service: &Service, base_url: &str, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Shorten { owner, url } => {
            let shortened = service.shorten(&owner, &url).await?;
            if !shortened.created {
                info!(id = %shortened.id, "url was already shortened");
            }
            println!("{}", short_url(base_url, &shortened.id));
        }
        Command::Batch { owner, urls } => {
            let items = urls
                .into_iter()
                .enumerate()
                .map(|(n, original_url)| BatchItem {
                    correlation_id: n.to_string(),
                    original_url,
                })
                .collect();
            for item in service.shorten_batch(&owner, items).await? {
                println!("{}\t{}", item.correlation_id, short_url(base_url, &item.id));
            }
        }
        Command::Expand { id } => {
            println!("{}", service.expand(&id).await?);
        }
        Command::List { owner } => {
            let links = service.list(&owner).await?;
            println!("{}", serde_json::to_string_pretty(&links)?);
        }
        Command::Delete { owner, ids } => {
            service.delete(&owner, ids).await?;
        }
        Command::Ping => {
            service.ping().await?;
            println!("ok");
        }
    }

    Ok(())
}
