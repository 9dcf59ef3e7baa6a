use thiserror::Error;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("url not found in repository: {0}")]
    NotFound(String),
    /// The original URL is already stored under `existing_id`.
    #[error("url already exists in repository. short url id: {existing_id}")]
    AlreadyExists { existing_id: String },
    #[error("short url id already taken: {0}")]
    DuplicateId(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("journal operation failed: {0}")]
    Journal(String),
}

impl StorageError {
    /// Returns `true` for a lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    /// Returns the id already associated with the original URL, if this is
    /// an original-URL conflict.
    pub fn existing_id(&self) -> Option<&str> {
        match self {
            StorageError::AlreadyExists { existing_id } => Some(existing_id),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Journal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_id_only_for_conflicts() {
        let conflict = StorageError::AlreadyExists {
            existing_id: "x1".to_string(),
        };

        assert_eq!(conflict.existing_id(), Some("x1"));
        assert_eq!(StorageError::NotFound("x1".into()).existing_id(), None);
    }

    #[test]
    fn not_found_is_distinguishable() {
        assert!(StorageError::NotFound("nope".into()).is_not_found());
        assert!(!StorageError::Query("boom".into()).is_not_found());
    }
}
