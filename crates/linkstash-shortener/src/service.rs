use crate::batch::BatchWriter;
use crate::error::{Result, ShortenerError};
use crate::pipeline::{DeleteRequest, DeletionPipeline, PipelineSettings};
use crate::shortener::{BatchItem, BatchShortened, Shortened, Shortener};
use async_trait::async_trait;
use linkstash_core::{deadline, LinkEntity, Repository, StorageError};
use linkstash_generator::Generator;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use typed_builder::TypedBuilder;

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, TypedBuilder)]
pub struct ServiceSettings {
    /// Links per bulk write in [`Shortener::shorten_batch`].
    #[builder(default = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
    /// Upper bound for every repository call made by the service.
    #[builder(default = DEFAULT_BACKEND_TIMEOUT)]
    pub backend_timeout: Duration,
    #[builder(default)]
    pub pipeline: PipelineSettings,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The [`Shortener`] backed by a [`Repository`] and a [`Generator`].
///
/// The generator is responsible for the uniqueness of new ids. No collision
/// retry is performed; a taken id surfaces as a storage error.
///
/// Deletions go through a [`DeletionPipeline`] owned by the service. Call
/// [`ShortenerService::close`] to let queued deletions finish.
#[derive(Debug)]
pub struct ShortenerService<R: ?Sized, G> {
    repository: Arc<R>,
    generator: G,
    deletions: DeletionPipeline,
    settings: ServiceSettings,
}

impl<R: Repository + ?Sized, G: Generator> ShortenerService<R, G> {
    /// Creates the service and starts its deletion workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(repository: Arc<R>, generator: G, settings: ServiceSettings) -> Self {
        let deletions =
            DeletionPipeline::start(Arc::clone(&repository), settings.pipeline.clone());
        Self {
            repository,
            generator,
            deletions,
            settings,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Stops accepting deletions and waits for queued ones to finish.
    pub async fn close(self) {
        info!("closing shortener service");
        self.deletions.drain().await;
    }

    /// Validates that the URL is absolute, with an http(s) scheme and a host.
    fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        };

        let scheme = scheme.to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                scheme
            )));
        }

        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty() || url.chars().any(char::is_whitespace) {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        }

        Ok(())
    }

    async fn bounded<T>(
        &self,
        operation: impl std::future::Future<Output = linkstash_core::Result<T>>,
    ) -> Result<T> {
        Ok(deadline::bounded(self.settings.backend_timeout, operation).await?)
    }
}

#[async_trait]
impl<R: Repository + ?Sized, G: Generator> Shortener for ShortenerService<R, G> {
    async fn shorten(&self, owner_id: &str, original_url: &str) -> Result<Shortened> {
        Self::validate_url(original_url)?;

        let id = self.generator.generate(original_url);
        let entity = LinkEntity::new(id.as_str(), original_url, owner_id);

        match self.bounded(self.repository.store(entity)).await {
            Ok(()) => Ok(Shortened { id, created: true }),
            Err(ShortenerError::Storage(StorageError::AlreadyExists { existing_id })) => {
                debug!(%existing_id, "url already shortened");
                Ok(Shortened {
                    id: existing_id,
                    created: false,
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn shorten_batch(
        &self,
        owner_id: &str,
        items: Vec<BatchItem>,
    ) -> Result<Vec<BatchShortened>> {
        for item in &items {
            Self::validate_url(&item.original_url)?;
        }

        let mut writer = BatchWriter::new(self.repository.as_ref(), self.settings.batch_size);
        let mut shortened = Vec::with_capacity(items.len());

        for item in items {
            let id = self.generator.generate(&item.original_url);
            let entity = LinkEntity::new(id.as_str(), item.original_url, owner_id);
            self.bounded(writer.add(entity)).await?;
            shortened.push(BatchShortened {
                correlation_id: item.correlation_id,
                id,
            });
        }
        self.bounded(writer.flush()).await?;

        info!(owner_id, links = shortened.len(), "batch shortened");
        Ok(shortened)
    }

    async fn expand(&self, id: &str) -> Result<String> {
        let entity = match self.bounded(self.repository.load(id)).await {
            Ok(entity) => entity,
            Err(ShortenerError::Storage(StorageError::NotFound(_))) => {
                return Err(ShortenerError::NotFound(id.to_string()))
            }
            Err(err) => return Err(err),
        };

        if entity.deleted {
            return Err(ShortenerError::Gone(id.to_string()));
        }
        Ok(entity.original_url)
    }

    async fn list(&self, owner_id: &str) -> Result<Vec<LinkEntity>> {
        let links = self.bounded(self.repository.load_by_owner(owner_id)).await?;
        Ok(links.into_iter().filter(|link| !link.deleted).collect())
    }

    async fn delete(&self, owner_id: &str, ids: Vec<String>) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        info!(owner_id, ids = ?ids, "scheduling url deletion");
        self.deletions
            .enqueue(DeleteRequest::new(owner_id, ids))
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.bounded(self.repository.ping()).await
    }
}
