pub mod file_kv_store;
pub mod memory_kv_store;
pub mod sqlite_kv_store;

pub use file_kv_store::FileKeyValueStore;
pub use memory_kv_store::MemoryKeyValueStore;
pub use sqlite_kv_store::{DbPool, SqliteKeyValueStore};

use crate::application::ports::offline_store::KeyValueStore;
use crate::shared::config::{StorageBackend, StorageConfig};
use crate::shared::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

/// 設定されたバックエンドでキー／バリューストアを開く
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, AppError> {
    let store: Arc<dyn KeyValueStore> = match config.backend {
        StorageBackend::Sqlite => Arc::new(
            SqliteKeyValueStore::connect(&config.database_url, config.max_connections).await?,
        ),
        StorageBackend::File => {
            Arc::new(FileKeyValueStore::new(PathBuf::from(&config.data_dir).join("kv")))
        }
        StorageBackend::Memory => Arc::new(MemoryKeyValueStore::new()),
    };
    tracing::debug!(target: "offline::storage", backend = ?config.backend, "offline store opened");
    Ok(store)
}
