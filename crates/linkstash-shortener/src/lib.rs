//! The linkstash shortener service.
//!
//! Builds on the [`Repository`](linkstash_core::Repository) contract: a
//! [`batch::BatchWriter`] for bulk inserts, a [`pipeline::DeletionPipeline`]
//! applying soft-deletes in the background, and the
//! [`service::ShortenerService`] facade tying both to an id generator.

pub mod batch;
pub mod error;
pub mod pipeline;
pub mod service;
pub mod shortener;

pub use batch::BatchWriter;
pub use error::{PipelineError, ShortenerError};
pub use pipeline::{DeleteRequest, DeletionPipeline, PipelineSettings};
pub use service::{ServiceSettings, ShortenerService};
pub use shortener::{short_url, BatchItem, BatchShortened, Shortened, Shortener};
