use serde::{Deserialize, Serialize};

/// A stored short-link record.
///
/// Records are never physically removed. Deletion flips `deleted` to `true`,
/// and the flag never goes back to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkEntity {
    /// The short identifier. Unique and immutable once assigned.
    pub id: String,
    /// The original URL that was shortened.
    pub original_url: String,
    /// The anonymous session that created the link.
    pub owner_id: String,
    /// Whether the link has been soft-deleted.
    #[serde(default)]
    pub deleted: bool,
}

impl LinkEntity {
    /// Creates a live (not deleted) entity.
    pub fn new(
        id: impl Into<String>,
        original_url: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            original_url: original_url.into(),
            owner_id: owner_id.into(),
            deleted: false,
        }
    }

    /// Returns `true` if the entity belongs to `owner_id`.
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }
}
