use async_trait::async_trait;
use linkstash_core::{LinkEntity, Repository, Result, StorageError};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Connection, Row};
use std::time::Duration;
use typed_builder::TypedBuilder;

const SCHEMA: &str = include_str!("../ddl/postgres/urls.sql");

/// Inserts a link unless its original URL is already stored, and returns the
/// id now associated with that URL in the same statement.
const INSERT_OR_EXISTING: &str = r#"
WITH new_link AS (
    INSERT INTO urls (url_id, original_url, user_id, deleted)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (original_url) DO NOTHING
    RETURNING url_id
)
SELECT COALESCE(
    (SELECT url_id FROM new_link),
    (SELECT url_id FROM urls WHERE original_url = $2)
) AS url_id
"#;

const INSERT: &str = r#"
INSERT INTO urls (url_id, original_url, user_id, deleted)
VALUES ($1, $2, $3, $4)
"#;

const SELECT_BY_ID: &str = r#"
SELECT url_id, original_url, user_id, deleted
FROM urls
WHERE url_id = $1
"#;

const SELECT_BY_OWNER: &str = r#"
SELECT url_id, original_url, user_id, deleted
FROM urls
WHERE user_id = $1
"#;

const MARK_DELETED: &str = r#"
UPDATE urls
SET deleted = TRUE
WHERE user_id = $1
  AND url_id = ANY($2)
"#;

/// Connection settings for [`PostgresRepository::connect`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct PostgresSettings {
    #[builder(default = 10)]
    pub max_connections: u32,
    #[builder(default = Duration::from_secs(5))]
    pub acquire_timeout: Duration,
    /// Upper bound for the schema bootstrap run at construction.
    #[builder(default = Duration::from_secs(5))]
    pub bootstrap_timeout: Duration,
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// PostgreSQL implementation of the repository contract.
///
/// Original URLs are unique: storing a URL that already exists reports the
/// existing id through [`StorageError::AlreadyExists`] instead of inserting.
/// Batches are written in one transaction and are not deduplicated, so a
/// duplicate anywhere in the batch rolls the whole batch back.
///
/// Statements are prepared and cached per connection by `sqlx`.
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a repository from an existing pool. The schema is assumed to
    /// exist; see [`PostgresRepository::bootstrap`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool and creates the `urls` table if it does not exist.
    ///
    /// A failed or slow bootstrap is fatal.
    pub async fn connect(database_url: &str, settings: &PostgresSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;

        let repository = Self::new(pool);
        repository.bootstrap(settings.bootstrap_timeout).await?;
        Ok(repository)
    }

    /// Creates the `urls` table with its uniqueness constraints.
    pub async fn bootstrap(&self, limit: Duration) -> Result<()> {
        linkstash_core::deadline::bounded(limit, async {
            sqlx::raw_sql(SCHEMA)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
            Ok(())
        })
        .await
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const URL_ID_CONSTRAINT: &str = "url_id_unique";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    err.as_database_error().and_then(|db| db.constraint())
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn map_insert_error(err: sqlx::Error, entity: &LinkEntity) -> StorageError {
    if is_unique_violation(&err) && violated_constraint(&err) == Some(URL_ID_CONSTRAINT) {
        return StorageError::DuplicateId(entity.id.clone());
    }
    map_sqlx_error(err)
}

fn entity_from_row(row: &PgRow) -> Result<LinkEntity> {
    Ok(LinkEntity {
        id: row.try_get("url_id").map_err(map_sqlx_error)?,
        original_url: row.try_get("original_url").map_err(map_sqlx_error)?,
        owner_id: row.try_get("user_id").map_err(map_sqlx_error)?,
        deleted: row.try_get("deleted").map_err(map_sqlx_error)?,
    })
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn store(&self, entity: LinkEntity) -> Result<()> {
        let row = sqlx::query(INSERT_OR_EXISTING)
            .bind(&entity.id)
            .bind(&entity.original_url)
            .bind(&entity.owner_id)
            .bind(entity.deleted)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| map_insert_error(err, &entity))?;

        let stored_id: Option<String> = row.try_get("url_id").map_err(map_sqlx_error)?;
        match stored_id {
            Some(id) if id == entity.id => Ok(()),
            Some(existing_id) => Err(StorageError::AlreadyExists { existing_id }),
            // The conflicting row belongs to a transaction this statement
            // cannot see yet.
            None => Err(StorageError::Query(format!(
                "original url '{}' conflicted with an uncommitted insert",
                entity.original_url
            ))),
        }
    }

    async fn store_batch(&self, entities: &[LinkEntity]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for entity in entities {
            let inserted = sqlx::query(INSERT)
                .bind(&entity.id)
                .bind(&entity.original_url)
                .bind(&entity.owner_id)
                .bind(entity.deleted)
                .execute(&mut *tx)
                .await;

            if let Err(err) = inserted {
                // The insert error is what the caller needs; a failed rollback
                // is resolved by the server when the connection resets.
                let _ = tx.rollback().await;
                return Err(map_insert_error(err, entity));
            }
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn load(&self, id: &str) -> Result<LinkEntity> {
        let row = sqlx::query(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => entity_from_row(&row),
            None => Err(StorageError::NotFound(id.to_string())),
        }
    }

    async fn load_by_owner(&self, owner_id: &str) -> Result<Vec<LinkEntity>> {
        let rows = sqlx::query(SELECT_BY_OWNER)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(entity_from_row).collect()
    }

    async fn delete_urls(&self, owner_id: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query(MARK_DELETED)
            .bind(owner_id)
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        conn.ping().await.map_err(map_sqlx_error)
    }
}
