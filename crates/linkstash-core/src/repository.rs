use crate::entity::LinkEntity;
use crate::error::Result;
use async_trait::async_trait;

/// Storage contract for short links.
///
/// Implemented by the in-memory engine and the relational engine. Engines
/// never physically remove records; deletion is a soft-delete that flips
/// [`LinkEntity::deleted`].
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Stores a single link.
    ///
    /// Engines that enforce original-URL uniqueness return
    /// `Err(AlreadyExists { existing_id })` when the URL is already stored
    /// under another id. Callers should switch to the existing id.
    async fn store(&self, entity: LinkEntity) -> Result<()>;

    /// Stores a batch of links in one bulk write.
    async fn store_batch(&self, entities: &[LinkEntity]) -> Result<()>;

    /// Loads a link by id. Returns `Err(NotFound)` if the id was never stored.
    ///
    /// Soft-deleted links are returned as well; callers check the flag.
    async fn load(&self, id: &str) -> Result<LinkEntity>;

    /// Returns every link created by `owner_id`, deleted or not.
    /// Returns an empty vector when the owner has none.
    async fn load_by_owner(&self, owner_id: &str) -> Result<Vec<LinkEntity>>;

    /// Marks the given links as deleted.
    ///
    /// Only links owned by `owner_id` are affected; unknown or foreign ids
    /// are skipped without error. Calling it again is a no-op.
    async fn delete_urls(&self, owner_id: &str, ids: &[String]) -> Result<()>;

    /// Checks that the backing store is reachable.
    async fn ping(&self) -> Result<()>;
}
