use crate::application::ports::offline_store::KeyValueStore;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite, sqlite::SqlitePoolOptions};
use std::path::Path;
use tracing::info;

pub type DbPool = Pool<Sqlite>;

/// `kv_store` テーブルに1キー1ドキュメントで保存する
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    pool: DbPool,
}

impl SqliteKeyValueStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        if let Some(path) = database_url.strip_prefix("sqlite:")
            && !path.starts_with(":memory:")
            && let Some(parent) = Path::new(path.trim_start_matches("//")).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let url = if database_url.contains("mode=") || database_url.contains(":memory:") {
            database_url.to_string()
        } else {
            format!("{database_url}?mode=rwc")
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await?;

        info!(target: "offline::storage", url = %database_url, "offline store connected");

        Self::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get::<String, _>("value")?)),
            None => Ok(None),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn memory_store() -> SqliteKeyValueStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteKeyValueStore::run_migrations(&pool).await.unwrap();
        SqliteKeyValueStore::new(pool)
    }

    #[tokio::test]
    async fn set_get_and_remove() {
        let store = memory_store().await;
        assert_eq!(store.get_item("queue").await.unwrap(), None);

        store.set_item("queue", "[]").await.unwrap();
        store.set_item("queue", "[1]").await.unwrap();
        assert_eq!(store.get_item("queue").await.unwrap().as_deref(), Some("[1]"));

        store.remove_item("queue").await.unwrap();
        assert_eq!(store.get_item("queue").await.unwrap(), None);
    }

    #[tokio::test]
    async fn values_survive_reconnect() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("offline.db");
        let url = format!("sqlite:{}", db_path.display());

        let store = SqliteKeyValueStore::connect(&url, 1).await.unwrap();
        store.set_item("queue", r#"[{"id":"1"}]"#).await.unwrap();
        store.pool().close().await;

        let reopened = SqliteKeyValueStore::connect(&url, 1).await.unwrap();
        assert_eq!(
            reopened.get_item("queue").await.unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );
    }
}
