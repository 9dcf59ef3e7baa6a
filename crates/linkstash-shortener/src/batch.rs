use linkstash_core::{LinkEntity, Repository, Result};

/// Buffers links and writes them to a repository in bulk.
///
/// The buffer is flushed with one [`Repository::store_batch`] call as soon as
/// it holds `batch_size` links, or when [`BatchWriter::flush`] is called.
/// A failed flush leaves the buffer untouched so the caller can retry or
/// give up; it is the caller's job to turn the failure into an error for its
/// own caller.
///
/// A writer is scoped to a single operation. `&mut self` on every write
/// keeps it from being shared.
#[derive(Debug)]
pub struct BatchWriter<'a, R: ?Sized> {
    repository: &'a R,
    batch_size: usize,
    buffer: Vec<LinkEntity>,
}

impl<'a, R: Repository + ?Sized> BatchWriter<'a, R> {
    /// Creates a writer that flushes every `batch_size` links. A size of zero
    /// is treated as one.
    pub fn new(repository: &'a R, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            repository,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Links added but not yet written.
    pub fn pending(&self) -> &[LinkEntity] {
        &self.buffer
    }

    /// Adds a link, flushing if the buffer is now full.
    pub async fn add(&mut self, entity: LinkEntity) -> Result<()> {
        self.buffer.push(entity);
        if self.buffer.len() >= self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// Writes all buffered links. Does nothing when the buffer is empty.
    pub async fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        self.repository.store_batch(&self.buffer).await?;
        self.buffer.clear();
        Ok(())
    }
}
