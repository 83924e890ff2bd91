use async_trait::async_trait;
use feedline_lib::application::ports::offline_store::KeyValueStore;
use feedline_lib::AppError;

/// すべての読み書きがストレージエラーになるストア
pub struct FailingKeyValueStore;

#[async_trait]
impl KeyValueStore for FailingKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        Err(AppError::Storage(format!("cannot read {key}: disk unavailable")))
    }

    async fn set_item(&self, key: &str, _value: &str) -> Result<(), AppError> {
        Err(AppError::Storage(format!("cannot write {key}: disk full")))
    }

    async fn remove_item(&self, key: &str) -> Result<(), AppError> {
        Err(AppError::Storage(format!("cannot remove {key}: disk unavailable")))
    }
}
