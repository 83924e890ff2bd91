use crate::application::ports::offline_store::{KeyValueStore, MutationQueue};
use crate::domain::entities::offline::QueuedMutation;
use crate::domain::value_objects::offline::MutationId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const QUEUE_KEY: &str = "offline_write_queue";
pub const DEAD_LETTER_KEY: &str = "offline_write_dead_letters";

/// ストレージ上の1ドキュメント（JSON配列）として保持する書き込みキュー。
///
/// レコードは1件ずつ解釈する。読めないレコードは元のJSONのまま残し、
/// 取り出し時に送信できない項目として返す。
pub struct PersistedMutationQueue {
    store: Arc<dyn KeyValueStore>,
    key: String,
    gate: Mutex<()>,
}

impl PersistedMutationQueue {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, QUEUE_KEY)
    }

    /// dead letter 用など、別キーに同じ形式のリストを持つ
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            gate: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    // 配列として読めない場合だけストレージ障害にする
    async fn load(&self) -> Result<Vec<Value>, AppError> {
        let Some(raw) = self.store.get_item(&self.key).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|err| {
            AppError::DeserializationError(format!(
                "Offline queue document `{}` is unreadable: {err}",
                self.key
            ))
        })
    }

    async fn save(&self, records: &[Value]) -> Result<(), AppError> {
        let raw = serde_json::to_string(records)
            .map_err(|err| AppError::SerializationError(err.to_string()))?;
        self.store.set_item(&self.key, &raw).await
    }

    fn decode(&self, position: usize, raw: &Value) -> QueuedMutation {
        match QueuedMutation::from_stored(raw) {
            Ok(item) => item,
            Err(err) => {
                let item = QueuedMutation::unreadable(raw, &err.to_string());
                warn!(
                    target: "offline::queue",
                    key = %self.key,
                    id = %item.id,
                    position,
                    error = %err,
                    "stored mutation is unreadable"
                );
                item
            }
        }
    }

    fn decode_all(&self, records: &[Value]) -> Vec<QueuedMutation> {
        records
            .iter()
            .enumerate()
            .map(|(position, raw)| self.decode(position, raw))
            .collect()
    }
}

#[async_trait]
impl MutationQueue for PersistedMutationQueue {
    async fn enqueue(&self, item: QueuedMutation) -> Result<QueuedMutation, AppError> {
        let _guard = self.gate.lock().await;
        let mut records = self.load().await?;

        if self
            .decode_all(&records)
            .iter()
            .any(|queued| queued.id == item.id)
        {
            return Err(AppError::ValidationError(format!(
                "Mutation {} is already queued",
                item.id
            )));
        }

        records.push(serde_json::to_value(&item)?);
        self.save(&records).await?;

        debug!(
            target: "offline::queue",
            key = %self.key,
            id = %item.id,
            kind = %item.mutation_type,
            depth = records.len(),
            "mutation enqueued"
        );
        Ok(item)
    }

    async fn dequeue(&self) -> Result<Option<QueuedMutation>, AppError> {
        let _guard = self.gate.lock().await;
        let mut records = self.load().await?;

        if records.is_empty() {
            return Ok(None);
        }

        let head = self.decode(0, &records.remove(0));
        self.save(&records).await?;

        debug!(
            target: "offline::queue",
            key = %self.key,
            id = %head.id,
            depth = records.len(),
            "mutation dequeued"
        );
        Ok(Some(head))
    }

    async fn dequeue_if(&self, id: &MutationId) -> Result<Option<QueuedMutation>, AppError> {
        let _guard = self.gate.lock().await;
        let mut records = self.load().await?;

        let Some(first) = records.first() else {
            return Ok(None);
        };
        let head = self.decode(0, first);
        if head.id != *id {
            return Ok(None);
        }

        records.remove(0);
        self.save(&records).await?;

        debug!(
            target: "offline::queue",
            key = %self.key,
            id = %head.id,
            depth = records.len(),
            "mutation dequeued"
        );
        Ok(Some(head))
    }

    async fn peek(&self) -> Result<Vec<QueuedMutation>, AppError> {
        let _guard = self.gate.lock().await;
        let records = self.load().await?;
        Ok(self.decode_all(&records))
    }

    async fn clear(&self) -> Result<(), AppError> {
        let _guard = self.gate.lock().await;
        self.store.remove_item(&self.key).await?;
        debug!(target: "offline::queue", key = %self.key, "queue cleared");
        Ok(())
    }
}
