use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

use shared::domain::{UserKey, UserRecord};

pub const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("user `{id}` already exists")]
    ConstraintViolation { id: UserKey },
    #[error("storage query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        let unavailable = matches!(
            err,
            sqlx::Error::Io(_)
                | sqlx::Error::Configuration(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
        );
        if unavailable {
            StorageError::Unavailable(err.to_string())
        } else {
            StorageError::Query(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// The persisted `users` table.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .map_err(|err| {
                StorageError::Unavailable(format!("invalid database url '{database_url}': {err}"))
            })?
            .create_if_missing(true);

        // Every pooled connection to an in-memory database must stay alive, or the table goes with it.
        let pool_options = if database_url.starts_with(MEMORY_DATABASE_URL) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|err| {
                StorageError::Unavailable(format!("failed to open '{database_url}': {err}"))
            })?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|err| StorageError::Unavailable(format!("schema migration failed: {err}")))?;

        tracing::debug!(database_url, "opened user store");
        Ok(Self { pool })
    }

    pub async fn open_in_memory() -> Result<Self> {
        Self::new(MEMORY_DATABASE_URL).await
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|err| StorageError::Unavailable(format!("sqlite ping failed: {err}")))?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Inserts every record or none of them.
    pub async fn bulk_add(&self, records: &[UserRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query("INSERT INTO users (id, name, image) VALUES (?1, ?2, ?3)")
                .bind(record.id.as_str())
                .bind(&record.name)
                .bind(&record.image)
                .execute(&mut *tx)
                .await
                .map_err(|err| constraint_or_query(err, &record.id))?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn to_array(&self) -> Result<Vec<UserRecord>> {
        let rows = sqlx::query("SELECT id, name, image FROM users ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(record_from_row).collect()
    }

    pub async fn get(&self, id: &UserKey) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT id, name, image FROM users WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    /// Absent ids are not an error.
    pub async fn delete(&self, id: &UserKey) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        tracing::debug!(user_id = %id, removed = result.rows_affected(), "deleted user row");
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        let result = sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        tracing::debug!(removed = result.rows_affected(), "cleared user table");
        Ok(())
    }
}

fn record_from_row(row: &SqliteRow) -> Result<UserRecord> {
    Ok(UserRecord {
        id: UserKey(row.try_get("id")?),
        name: row.try_get("name")?,
        image: row.try_get("image")?,
    })
}

fn constraint_or_query(err: sqlx::Error, id: &UserKey) -> StorageError {
    let is_unique = err
        .as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false);
    if is_unique {
        StorageError::ConstraintViolation { id: id.clone() }
    } else {
        StorageError::from(err)
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).map_err(|err| {
        StorageError::Unavailable(format!(
            "failed to create parent directory '{}' for database url '{database_url}': {err}",
            parent.display()
        ))
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with(MEMORY_DATABASE_URL) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
