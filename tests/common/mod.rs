#![allow(dead_code)]

pub mod mocks;

use feedline_lib::application::ports::connectivity::ConnectivityProbe;
use feedline_lib::application::ports::offline_store::MutationQueue;
use feedline_lib::domain::value_objects::offline::{MutationId, MutationPayload, MutationType};
use feedline_lib::infrastructure::connectivity::ManualConnectivity;
use feedline_lib::infrastructure::storage::SqliteKeyValueStore;
use feedline_lib::shared::config::{AppConfig, AppMode, StorageBackend};
use feedline_lib::{AppState, QueuedMutation};
use mocks::RecordingRepository;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const USER_ID: &str = "u1";

pub async fn memory_sqlite_store() -> SqliteKeyValueStore {
    SqliteKeyValueStore::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory sqlite")
}

pub fn queued(id: &str, kind: &str, payload: Value) -> QueuedMutation {
    QueuedMutation::new(
        MutationId::new(id.to_string()).expect("mutation id"),
        MutationType::new(kind.to_string()).expect("mutation type"),
        MutationPayload::new(payload).expect("payload"),
        chrono::Utc::now().timestamp_millis(),
    )
}

pub fn queued_like(id: &str, post_id: i64) -> QueuedMutation {
    queued(id, "like_post", json!({"postId": post_id, "userId": USER_ID}))
}

pub struct PipelineContext {
    pub state: AppState,
    pub repos: Arc<RecordingRepository>,
    pub connectivity: Arc<ManualConnectivity>,
    pub data_dir: TempDir,
}

/// ライブモード＋メモリストアで組み立てたパイプライン
pub async fn setup_pipeline(online: bool) -> PipelineContext {
    let data_dir = tempfile::tempdir().expect("tempdir");
    let mut config = AppConfig::default();
    config.mode = AppMode::Live;
    config.storage.backend = StorageBackend::Memory;
    config.storage.data_dir = data_dir.path().display().to_string();

    let repos = RecordingRepository::new();
    let connectivity = Arc::new(ManualConnectivity::new(online));
    let probe: Arc<dyn ConnectivityProbe> = connectivity.clone();
    let state = AppState::new(config, repos.repositories(), probe, None)
        .await
        .expect("app state");

    PipelineContext {
        state,
        repos,
        connectivity,
        data_dir,
    }
}

/// キューが指定件数になるまで待つ（バックグラウンドのリスナー用）
pub async fn wait_for_queue_len(queue: &Arc<dyn MutationQueue>, expected: usize) {
    let result = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if queue.len().await.expect("queue len") == expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(result.is_ok(), "queue never reached length {expected}");
}
