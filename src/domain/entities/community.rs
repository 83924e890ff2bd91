use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub owner_id: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommunity {
    pub title: String,
    pub description: String,
    pub owner_id: String,
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// コミュニティ購読。未作成の購読は `id == 0`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: i64,
    pub user_id: String,
    pub community_id: i64,
}

impl Subscription {
    pub fn new(id: i64, user_id: impl Into<String>, community_id: i64) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            community_id,
        }
    }
}

/// ローカルキャッシュ上のコミュニティ購読状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommunityMembership {
    pub subscription: Option<Subscription>,
    pub subscribers_count: u32,
}
