use crate::domain::entities::offline::QueuedMutation;
use crate::domain::value_objects::offline::MutationId;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// 端末に永続化される書き込みキュー。
///
/// 各操作は「全件読み込み → 変更 → 全件書き戻し」を1単位として扱う。
/// 消費者は1つ（同期ラン）である前提。
#[async_trait]
pub trait MutationQueue: Send + Sync {
    async fn enqueue(&self, item: QueuedMutation) -> Result<QueuedMutation, AppError>;
    async fn dequeue(&self) -> Result<Option<QueuedMutation>, AppError>;
    /// 先頭が `id` のときだけ取り出す。確認と削除は同じロック内で行う
    async fn dequeue_if(&self, id: &MutationId) -> Result<Option<QueuedMutation>, AppError>;
    async fn peek(&self) -> Result<Vec<QueuedMutation>, AppError>;
    async fn clear(&self) -> Result<(), AppError>;

    async fn head(&self) -> Result<Option<QueuedMutation>, AppError> {
        Ok(self.peek().await?.into_iter().next())
    }

    async fn len(&self) -> Result<usize, AppError> {
        Ok(self.peek().await?.len())
    }
}

/// 任意の文字列をキー単位で保存する端末ストレージ
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove_item(&self, key: &str) -> Result<(), AppError>;
}
