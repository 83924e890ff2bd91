use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    #[default]
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub content: String,
    pub image_url: Option<String>,
    pub community_id: i64,
    pub user_id: String,
    pub likes_count: u32,
    pub comments_count: u32,
    pub is_liked: bool,
    pub is_saved: bool,
    pub moderation_status: ModerationStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn new(id: i64, content: impl Into<String>, community_id: i64, user_id: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            image_url: None,
            community_id,
            user_id: user_id.into(),
            likes_count: 0,
            comments_count: 0,
            is_liked: false,
            is_saved: false,
            moderation_status: ModerationStatus::Approved,
            created_at: None,
        }
    }

    pub fn with_likes(mut self, likes_count: u32, is_liked: bool) -> Self {
        self.likes_count = likes_count;
        self.is_liked = is_liked;
        self
    }

    pub fn with_saved(mut self, is_saved: bool) -> Self {
        self.is_saved = is_saved;
        self
    }

    pub fn apply(&mut self, patch: &PostPatch) {
        if let Some(is_liked) = patch.is_liked {
            self.is_liked = is_liked;
        }
        if let Some(likes_count) = patch.likes_count {
            self.likes_count = likes_count;
        }
        if let Some(is_saved) = patch.is_saved {
            self.is_saved = is_saved;
        }
        if let Some(comments_count) = patch.comments_count {
            self.comments_count = comments_count;
        }
    }
}

/// ローカルキャッシュ上の投稿に対する部分更新
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub is_liked: Option<bool>,
    pub likes_count: Option<u32>,
    pub is_saved: Option<bool>,
    pub comments_count: Option<u32>,
}

/// 作成前の投稿（リモート側でIDが振られる）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub content: String,
    pub community_id: i64,
    pub user_id: String,
    pub moderation_status: ModerationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_only_touches_given_fields() {
        let mut post = Post::new(1, "hello", 3, "u1").with_likes(4, false);
        post.apply(&PostPatch {
            is_liked: Some(true),
            ..PostPatch::default()
        });
        assert!(post.is_liked);
        assert_eq!(post.likes_count, 4);
        assert!(!post.is_saved);
    }

    #[test]
    fn moderation_status_uses_lowercase_wire_names() {
        let json = serde_json::to_string(&ModerationStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        assert_eq!(ModerationStatus::default(), ModerationStatus::Approved);
    }
}
