use crate::journal::Journal;
use async_trait::async_trait;
use linkstash_core::{LinkEntity, Repository, Result, StorageError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;

/// In-memory implementation of the [`Repository`] trait.
///
/// All links live in one map behind a reader/writer lock: lookups run in
/// parallel, writes are exclusive. With a [`Journal`] configured, every
/// write is appended to the journal before the write lock is released, so
/// disk I/O happens inside the critical section.
///
/// Original-URL uniqueness is not enforced. Storing an id twice overwrites
/// the first record.
///
/// A failed journal append is returned to the caller, but the map keeps the
/// write that preceded it.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    links: RwLock<HashMap<String, LinkEntity>>,
    journal: Option<Journal>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository without persistence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository persisted to the journal at `path`.
    ///
    /// The journal is replayed first; a malformed journal aborts construction.
    pub fn with_journal(path: impl Into<PathBuf>) -> Result<Self> {
        let journal = Journal::new(path);
        let mut links = HashMap::new();
        journal.replay(&mut links)?;

        Ok(Self {
            links: RwLock::new(links),
            journal: Some(journal),
        })
    }

    /// Returns the journal backing this repository, if any.
    pub fn journal(&self) -> Option<&Journal> {
        self.journal.as_ref()
    }

    /// Number of links held, deleted ones included.
    pub fn len(&self) -> usize {
        self.links.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn store(&self, entity: LinkEntity) -> Result<()> {
        let line = match self.journal {
            Some(_) => Some(Journal::encode(&entity)?),
            None => None,
        };

        let mut links = self.links.write();
        links.insert(entity.id.clone(), entity);

        if let (Some(journal), Some(line)) = (&self.journal, line) {
            journal.append_encoded(&line)?;
        }

        Ok(())
    }

    async fn store_batch(&self, entities: &[LinkEntity]) -> Result<()> {
        // The batch goes to the journal as one append, not line by line.
        let lines = match self.journal {
            Some(_) => Some(entities.iter().map(Journal::encode).collect::<Result<String>>()?),
            None => None,
        };

        let mut links = self.links.write();
        for entity in entities {
            links.insert(entity.id.clone(), entity.clone());
        }

        if let (Some(journal), Some(lines)) = (&self.journal, lines) {
            journal.append_encoded(&lines)?;
        }

        Ok(())
    }

    async fn load(&self, id: &str) -> Result<LinkEntity> {
        self.links
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn load_by_owner(&self, owner_id: &str) -> Result<Vec<LinkEntity>> {
        Ok(self
            .links
            .read()
            .values()
            .filter(|entity| entity.is_owned_by(owner_id))
            .cloned()
            .collect())
    }

    async fn delete_urls(&self, owner_id: &str, ids: &[String]) -> Result<()> {
        let mut links = self.links.write();

        for id in ids {
            let Some(entity) = links.get_mut(id) else {
                continue;
            };
            if !entity.is_owned_by(owner_id) || entity.deleted {
                continue;
            }

            entity.deleted = true;
            if let Some(journal) = &self.journal {
                journal.append(entity)?;
            }
        }

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn entity(id: &str, url: &str, owner: &str) -> LinkEntity {
        LinkEntity::new(id, url, owner)
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn store_and_load() {
        let repo = InMemoryRepository::new();
        let stored = entity("abc", "http://a.com", "u1");

        repo.store(stored.clone()).await.unwrap();

        assert_eq!(repo.load("abc").await.unwrap(), stored);
    }

    #[tokio::test]
    async fn load_nonexistent() {
        let repo = InMemoryRepository::new();

        let err = repo.load("nope").await.unwrap_err();
        assert_eq!(err, StorageError::NotFound("nope".to_string()));
    }

    #[tokio::test]
    async fn store_overwrites_by_id() {
        let repo = InMemoryRepository::new();

        repo.store(entity("abc", "http://a.com", "u1")).await.unwrap();
        repo.store(entity("abc", "http://b.com", "u1")).await.unwrap();

        let loaded = repo.load("abc").await.unwrap();
        assert_eq!(loaded.original_url, "http://b.com");
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn same_url_under_two_ids_is_not_deduplicated() {
        let repo = InMemoryRepository::new();

        repo.store(entity("x1", "http://a.com", "u1")).await.unwrap();
        repo.store(entity("x2", "http://a.com", "u1")).await.unwrap();

        assert_eq!(repo.load("x1").await.unwrap().original_url, "http://a.com");
        assert_eq!(repo.load("x2").await.unwrap().original_url, "http://a.com");
    }

    #[tokio::test]
    async fn store_batch_applies_all() {
        let repo = InMemoryRepository::new();
        let batch = vec![
            entity("a", "http://a.com", "u1"),
            entity("b", "http://b.com", "u1"),
            entity("c", "http://c.com", "u2"),
        ];

        repo.store_batch(&batch).await.unwrap();

        for stored in &batch {
            assert_eq!(&repo.load(&stored.id).await.unwrap(), stored);
        }
    }

    #[tokio::test]
    async fn load_by_owner_returns_exactly_owned_links() {
        let repo = InMemoryRepository::new();
        repo.store(entity("a", "http://a.com", "u1")).await.unwrap();
        repo.store(entity("b", "http://b.com", "u1")).await.unwrap();
        repo.store(entity("c", "http://c.com", "u2")).await.unwrap();
        repo.delete_urls("u1", &ids(&["b"])).await.unwrap();

        let mut owned = repo.load_by_owner("u1").await.unwrap();
        owned.sort_by(|l, r| l.id.cmp(&r.id));

        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].id, "a");
        assert!(!owned[0].deleted);
        assert_eq!(owned[1].id, "b");
        assert!(owned[1].deleted);
    }

    #[tokio::test]
    async fn load_by_owner_without_links_is_empty() {
        let repo = InMemoryRepository::new();
        repo.store(entity("a", "http://a.com", "u1")).await.unwrap();

        assert!(repo.load_by_owner("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repo = InMemoryRepository::new();
        repo.store(entity("a", "http://a.com", "u1")).await.unwrap();

        repo.delete_urls("u1", &ids(&["a"])).await.unwrap();
        assert!(repo.load("a").await.unwrap().deleted);

        repo.delete_urls("u1", &ids(&["a"])).await.unwrap();
        assert!(repo.load("a").await.unwrap().deleted);
    }

    #[tokio::test]
    async fn delete_skips_foreign_and_unknown_ids() {
        let repo = InMemoryRepository::new();
        repo.store(entity("a", "http://a.com", "u1")).await.unwrap();
        repo.store(entity("b", "http://b.com", "u2")).await.unwrap();

        repo.delete_urls("u1", &ids(&["a", "b", "missing"]))
            .await
            .unwrap();

        assert!(repo.load("a").await.unwrap().deleted);
        assert!(!repo.load("b").await.unwrap().deleted);
    }

    #[tokio::test]
    async fn ping_always_succeeds() {
        assert!(InMemoryRepository::new().ping().await.is_ok());
    }

    #[tokio::test]
    async fn journal_round_trip_reproduces_final_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.log");

        {
            let repo = InMemoryRepository::with_journal(&path).unwrap();
            repo.store(entity("a", "http://a.com", "u1")).await.unwrap();
            repo.store(entity("b", "http://b.com", "u1")).await.unwrap();
            repo.store(entity("c", "http://c.com", "u2")).await.unwrap();
            repo.store(entity("a", "http://a2.com", "u1")).await.unwrap();
            repo.store_batch(&[
                entity("d", "http://d.com", "u2"),
                entity("e", "http://e.com", "u2"),
            ])
            .await
            .unwrap();
            repo.delete_urls("u1", &ids(&["b"])).await.unwrap();
        }

        let reopened = InMemoryRepository::with_journal(&path).unwrap();

        assert_eq!(reopened.len(), 5);
        assert_eq!(
            reopened.load("a").await.unwrap(),
            entity("a", "http://a2.com", "u1")
        );
        assert!(reopened.load("b").await.unwrap().deleted);
        assert!(!reopened.load("c").await.unwrap().deleted);
        assert_eq!(reopened.load("e").await.unwrap().owner_id, "u2");
    }

    #[tokio::test]
    async fn repeated_delete_does_not_grow_journal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.log");
        let repo = InMemoryRepository::with_journal(&path).unwrap();

        repo.store(entity("a", "http://a.com", "u1")).await.unwrap();
        repo.delete_urls("u1", &ids(&["a"])).await.unwrap();
        repo.delete_urls("u1", &ids(&["a"])).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[tokio::test]
    async fn malformed_journal_aborts_construction() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.log");
        std::fs::write(&path, "a\tu1\thttp://a.com\tmaybe\n").unwrap();

        let err = InMemoryRepository::with_journal(&path).unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));
    }

    #[tokio::test]
    async fn unencodable_entity_is_rejected_before_write() {
        let dir = TempDir::new().unwrap();
        let repo = InMemoryRepository::with_journal(dir.path().join("links.log")).unwrap();

        let err = repo
            .store(entity("a", "http://a.com/\tsplit", "u1"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::InvalidData(_)));
        assert!(repo.load("a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn failed_append_keeps_the_write_in_memory() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened for appending.
        let repo = InMemoryRepository {
            links: RwLock::new(HashMap::new()),
            journal: Some(Journal::new(dir.path())),
        };

        let err = repo
            .store(entity("a", "http://a.com", "u1"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Journal(_)));
        assert_eq!(repo.load("a").await.unwrap().original_url, "http://a.com");
    }

    #[tokio::test]
    async fn concurrent_access() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = vec![];

        for i in 0..10u64 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.store(LinkEntity::new(
                    format!("code-{:03}", i),
                    format!("https://example{}.com", i),
                    "u1",
                ))
                .await
                .unwrap();
            }));
        }

        for i in 0..10u64 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                let _ = repo.load(&format!("code-{:03}", i)).await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(repo.load_by_owner("u1").await.unwrap().len(), 10);
        for i in 0..10u64 {
            let loaded = repo.load(&format!("code-{:03}", i)).await.unwrap();
            assert_eq!(loaded.original_url, format!("https://example{}.com", i));
        }
    }
}
