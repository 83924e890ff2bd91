use crate::domain::entities::{CommunityMembership, Post, PostPatch, Subscription};

/// 楽観的更新が触ってよい投稿ストアの入口だけを公開する
pub trait PostStateStore: Send + Sync {
    fn post(&self, post_id: i64) -> Option<Post>;
    /// 存在しない投稿へのパッチは無視される
    fn update_post(&self, post_id: i64, patch: PostPatch);
    fn saved_ids(&self, user_id: &str) -> Vec<i64>;
    /// 保存済みインデックスの `position` に投稿を置く（既にあれば何もしない）
    fn insert_saved(&self, user_id: &str, post_id: i64, position: usize);
    fn remove_saved(&self, user_id: &str, post_id: i64);
}

pub trait CommunityStateStore: Send + Sync {
    fn membership(&self, community_id: i64) -> CommunityMembership;
    fn set_subscription(&self, community_id: i64, subscription: Option<Subscription>);
    fn set_subscribers_count(&self, community_id: i64, count: u32);
}
