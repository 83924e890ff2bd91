use crate::application::ports::cache::{CommunityStateStore, PostStateStore};
use crate::domain::entities::{CommunityMembership, Post, PostPatch, Subscription};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// UIが参照する正規化済みローカルキャッシュ。
///
/// 楽観的更新は同期的なクロージャ（rollback）から呼ばれるため、
/// ロックは `std::sync::RwLock` を使い、await を跨いで保持しない。
#[derive(Default)]
pub struct LocalCache {
    posts_by_id: RwLock<HashMap<i64, Post>>,
    saved_ids: RwLock<HashMap<String, Vec<i64>>>,
    communities: RwLock<HashMap<i64, CommunityMembership>>,
}

impl LocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 投稿を追加・上書きする
    pub fn upsert_posts(&self, posts: Vec<Post>) {
        let mut map = self
            .posts_by_id
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for post in posts {
            map.insert(post.id, post);
        }
    }

    /// リモートから取得した保存済み一覧でインデックスを置き換える
    pub fn set_saved_posts(&self, user_id: &str, posts: Vec<Post>) {
        let ids = posts.iter().map(|post| post.id).collect();
        self.upsert_posts(posts);
        let mut saved = self.saved_ids.write().unwrap_or_else(PoisonError::into_inner);
        saved.insert(user_id.to_string(), ids);
    }

    pub fn saved_posts(&self, user_id: &str) -> Vec<Post> {
        let ids = PostStateStore::saved_ids(self, user_id);
        let map = self.posts_by_id.read().unwrap_or_else(PoisonError::into_inner);
        ids.iter().filter_map(|id| map.get(id).cloned()).collect()
    }

    pub fn set_membership(&self, community_id: i64, membership: CommunityMembership) {
        let mut communities = self
            .communities
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        communities.insert(community_id, membership);
    }

    /// サインアウト時などにすべて破棄する
    pub fn reset(&self) {
        self.posts_by_id
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.saved_ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.communities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl PostStateStore for LocalCache {
    fn post(&self, post_id: i64) -> Option<Post> {
        let map = self.posts_by_id.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&post_id).cloned()
    }

    fn update_post(&self, post_id: i64, patch: PostPatch) {
        let mut map = self
            .posts_by_id
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(post) = map.get_mut(&post_id) {
            post.apply(&patch);
        }
    }

    fn saved_ids(&self, user_id: &str) -> Vec<i64> {
        let saved = self.saved_ids.read().unwrap_or_else(PoisonError::into_inner);
        saved.get(user_id).cloned().unwrap_or_default()
    }

    fn insert_saved(&self, user_id: &str, post_id: i64, position: usize) {
        let mut saved = self.saved_ids.write().unwrap_or_else(PoisonError::into_inner);
        let ids = saved.entry(user_id.to_string()).or_default();
        if ids.contains(&post_id) {
            return;
        }
        let position = position.min(ids.len());
        ids.insert(position, post_id);
    }

    fn remove_saved(&self, user_id: &str, post_id: i64) {
        let mut saved = self.saved_ids.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(ids) = saved.get_mut(user_id) {
            ids.retain(|id| *id != post_id);
        }
    }
}

impl CommunityStateStore for LocalCache {
    fn membership(&self, community_id: i64) -> CommunityMembership {
        let communities = self
            .communities
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        communities.get(&community_id).cloned().unwrap_or_default()
    }

    fn set_subscription(&self, community_id: i64, subscription: Option<Subscription>) {
        let mut communities = self
            .communities
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        communities.entry(community_id).or_default().subscription = subscription;
    }

    fn set_subscribers_count(&self, community_id: i64, count: u32) {
        let mut communities = self
            .communities
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        communities.entry(community_id).or_default().subscribers_count = count;
    }
}
