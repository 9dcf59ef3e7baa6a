use crate::error::PipelineError;
use linkstash_core::{deadline, Repository};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A request to soft-delete links on behalf of their owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub owner_id: String,
    pub ids: Vec<String>,
}

impl DeleteRequest {
    pub fn new(owner_id: impl Into<String>, ids: Vec<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            ids,
        }
    }
}

/// Tuning for [`DeletionPipeline`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct PipelineSettings {
    /// Number of long-lived workers.
    #[builder(default = DEFAULT_WORKERS)]
    pub workers: usize,
    /// Queue capacity; twice the worker count when unset.
    #[builder(default, setter(strip_option))]
    pub queue_capacity: Option<usize>,
    /// Upper bound for a single `delete_urls` call.
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,
}

impl PipelineSettings {
    fn worker_count(&self) -> usize {
        self.workers.max(1)
    }

    fn capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or(self.worker_count() * 2)
            .max(1)
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Applies soft-deletes in the background.
///
/// A fixed pool of workers consumes one shared bounded queue. Producers only
/// wait when the queue is full. Each request is handled by one worker with
/// its own timeout and its outcome goes to the log, never back to the
/// producer. A failed request is not retried.
///
/// Delivery is best effort: [`DeletionPipeline::shutdown`] drops whatever is
/// still queued. [`DeletionPipeline::drain`] stops intake and waits for the
/// queue to empty instead.
///
/// Must be started from within a Tokio runtime.
#[derive(Debug)]
pub struct DeletionPipeline {
    sender: mpsc::Sender<DeleteRequest>,
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl DeletionPipeline {
    /// Spawns the workers.
    pub fn start<R: Repository + ?Sized>(repository: Arc<R>, settings: PipelineSettings) -> Self {
        let (sender, receiver) = mpsc::channel(settings.capacity());
        let queue = Arc::new(Mutex::new(receiver));
        let (shutdown, _) = watch::channel(false);

        let workers = (1..=settings.worker_count())
            .map(|n| {
                let worker = Worker {
                    id: format!("delete-worker-{n}"),
                    repository: Arc::clone(&repository),
                    queue: Arc::clone(&queue),
                    shutdown: shutdown.subscribe(),
                    request_timeout: settings.request_timeout,
                };
                tokio::spawn(worker.run())
            })
            .collect();

        Self {
            sender,
            shutdown,
            workers,
        }
    }

    /// Queues a request, waiting only while the queue is full.
    pub async fn enqueue(&self, request: DeleteRequest) -> Result<(), PipelineError> {
        self.sender
            .send(request)
            .await
            .map_err(|_| PipelineError::Closed)
    }

    /// Queues a request without waiting.
    pub fn try_enqueue(&self, request: DeleteRequest) -> Result<(), PipelineError> {
        self.sender.try_send(request).map_err(|err| match err {
            TrySendError::Full(_) => PipelineError::Full,
            TrySendError::Closed(_) => PipelineError::Closed,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Free slots left in the queue.
    pub fn available_capacity(&self) -> usize {
        self.sender.capacity()
    }

    /// Signals the workers to stop and returns without waiting for them.
    ///
    /// Queued requests are dropped. A request already being processed runs
    /// until it finishes or times out.
    pub fn shutdown(self) {
        info!(workers = self.workers.len(), "shutting down deletion pipeline");
        self.shutdown.send_replace(true);
    }

    /// Stops accepting requests and waits until every queued request has
    /// been processed.
    pub async fn drain(self) {
        let Self {
            sender,
            shutdown,
            workers,
        } = self;
        drop(sender);

        for worker in workers {
            if let Err(err) = worker.await {
                warn!(error = %err, "delete worker ended abnormally");
            }
        }
        drop(shutdown);
    }
}

struct Worker<R: ?Sized> {
    id: String,
    repository: Arc<R>,
    queue: Arc<Mutex<mpsc::Receiver<DeleteRequest>>>,
    shutdown: watch::Receiver<bool>,
    request_timeout: Duration,
}

impl<R: Repository + ?Sized> Worker<R> {
    async fn run(mut self) {
        info!(worker = %self.id, "starting delete worker");

        loop {
            let request = tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                request = next_request(&self.queue) => match request {
                    Some(request) => request,
                    None => break,
                },
            };
            self.process(request).await;
        }

        info!(worker = %self.id, "stopping delete worker");
    }

    async fn process(&self, request: DeleteRequest) {
        let outcome = deadline::bounded(
            self.request_timeout,
            self.repository
                .delete_urls(&request.owner_id, &request.ids),
        )
        .await;

        match outcome {
            Ok(()) => info!(
                worker = %self.id,
                owner_id = %request.owner_id,
                ids = ?request.ids,
                "urls deleted"
            ),
            Err(err) => error!(
                worker = %self.id,
                owner_id = %request.owner_id,
                ids = ?request.ids,
                error = %err,
                "error while deleting user urls"
            ),
        }
    }
}

async fn next_request(queue: &Mutex<mpsc::Receiver<DeleteRequest>>) -> Option<DeleteRequest> {
    queue.lock().await.recv().await
}
