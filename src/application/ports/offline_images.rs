use async_trait::async_trait;

/// オフライン投稿の画像をアプリ管理領域へ退避する。
/// 失敗しても元のURIを返し、書き込み自体は止めない。
#[async_trait]
pub trait OfflineImageStore: Send + Sync {
    async fn persist(&self, uri: &str) -> String;
}
