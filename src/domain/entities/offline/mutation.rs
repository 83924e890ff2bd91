use crate::domain::entities::{ModerationStatus, NewComment, NewCommunity, NewPost, Subscription};
use crate::domain::value_objects::offline::{MutationKind, MutationPayload, MutationType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationDecodeError {
    #[error("Unknown queued write: {0}")]
    UnknownType(String),

    #[error("Invalid payload for {kind}: {reason}")]
    InvalidPayload { kind: MutationKind, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostPayload {
    pub content: String,
    pub community_id: i64,
    pub user_id: String,
    #[serde(default)]
    pub image_uri: Option<String>,
    #[serde(default)]
    pub moderation_status: ModerationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// like / unlike / save / unsave 共通
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostTargetPayload {
    pub post_id: i64,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentPayload {
    pub post_id: i64,
    pub user_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPayload {
    pub id: i64,
    pub user_id: String,
    pub community_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommunityPayload {
    pub title: String,
    pub description: String,
    pub owner_id: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// 種別ごとにスキーマが確定したミューテーション
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreatePost(CreatePostPayload),
    AddComment(AddCommentPayload),
    LikePost(PostTargetPayload),
    UnlikePost(PostTargetPayload),
    SavePost(PostTargetPayload),
    UnsavePost(PostTargetPayload),
    SubscribeCommunity(SubscriptionPayload),
    UnsubscribeCommunity(SubscriptionPayload),
    CreateCommunity(CreateCommunityPayload),
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::CreatePost(_) => MutationKind::CreatePost,
            Mutation::AddComment(_) => MutationKind::AddComment,
            Mutation::LikePost(_) => MutationKind::LikePost,
            Mutation::UnlikePost(_) => MutationKind::UnlikePost,
            Mutation::SavePost(_) => MutationKind::SavePost,
            Mutation::UnsavePost(_) => MutationKind::UnsavePost,
            Mutation::SubscribeCommunity(_) => MutationKind::SubscribeCommunity,
            Mutation::UnsubscribeCommunity(_) => MutationKind::UnsubscribeCommunity,
            Mutation::CreateCommunity(_) => MutationKind::CreateCommunity,
        }
    }

    pub fn decode(
        mutation_type: &MutationType,
        payload: &MutationPayload,
    ) -> Result<Self, MutationDecodeError> {
        let kind = mutation_type
            .kind()
            .ok_or_else(|| MutationDecodeError::UnknownType(mutation_type.to_string()))?;

        let mutation = match kind {
            MutationKind::CreatePost => Mutation::CreatePost(parse(kind, payload)?),
            MutationKind::AddComment => Mutation::AddComment(parse(kind, payload)?),
            MutationKind::LikePost => Mutation::LikePost(parse(kind, payload)?),
            MutationKind::UnlikePost => Mutation::UnlikePost(parse(kind, payload)?),
            MutationKind::SavePost => Mutation::SavePost(parse(kind, payload)?),
            MutationKind::UnsavePost => Mutation::UnsavePost(parse(kind, payload)?),
            MutationKind::SubscribeCommunity => {
                Mutation::SubscribeCommunity(parse(kind, payload)?)
            }
            MutationKind::UnsubscribeCommunity => {
                Mutation::UnsubscribeCommunity(parse(kind, payload)?)
            }
            MutationKind::CreateCommunity => Mutation::CreateCommunity(parse(kind, payload)?),
        };

        mutation
            .validate()
            .map_err(|reason| MutationDecodeError::InvalidPayload { kind, reason })?;
        Ok(mutation)
    }

    pub fn to_payload(&self) -> Result<MutationPayload, String> {
        let value = match self {
            Mutation::CreatePost(p) => serde_json::to_value(p),
            Mutation::AddComment(p) => serde_json::to_value(p),
            Mutation::LikePost(p)
            | Mutation::UnlikePost(p)
            | Mutation::SavePost(p)
            | Mutation::UnsavePost(p) => serde_json::to_value(p),
            Mutation::SubscribeCommunity(p) | Mutation::UnsubscribeCommunity(p) => {
                serde_json::to_value(p)
            }
            Mutation::CreateCommunity(p) => serde_json::to_value(p),
        }
        .map_err(|e| format!("Failed to encode {} payload: {e}", self.kind()))?;
        MutationPayload::new(value)
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Mutation::CreatePost(p) => {
                require_text("content", &p.content)?;
                require_positive("communityId", p.community_id)?;
                require_text("userId", &p.user_id)
            }
            Mutation::AddComment(p) => {
                require_positive("postId", p.post_id)?;
                require_text("userId", &p.user_id)?;
                require_text("content", &p.content)
            }
            Mutation::LikePost(p)
            | Mutation::UnlikePost(p)
            | Mutation::SavePost(p)
            | Mutation::UnsavePost(p) => {
                require_positive("postId", p.post_id)?;
                require_text("userId", &p.user_id)
            }
            Mutation::SubscribeCommunity(p) | Mutation::UnsubscribeCommunity(p) => {
                if p.id < 0 {
                    return Err("id must not be negative".to_string());
                }
                require_positive("communityId", p.community_id)?;
                require_text("userId", &p.user_id)
            }
            Mutation::CreateCommunity(p) => {
                require_text("title", &p.title)?;
                require_text("ownerId", &p.owner_id)
            }
        }
    }
}

impl CreatePostPayload {
    pub fn to_new_post(&self) -> NewPost {
        NewPost {
            content: self.content.clone(),
            community_id: self.community_id,
            user_id: self.user_id.clone(),
            moderation_status: self.moderation_status,
            idempotency_key: self.idempotency_key.clone(),
        }
    }
}

impl AddCommentPayload {
    pub fn to_new_comment(&self) -> NewComment {
        NewComment {
            post_id: self.post_id,
            user_id: self.user_id.clone(),
            content: self.content.clone(),
            idempotency_key: self.idempotency_key.clone(),
        }
    }
}

impl SubscriptionPayload {
    pub fn to_subscription(&self) -> Subscription {
        Subscription::new(self.id, self.user_id.clone(), self.community_id)
    }
}

impl From<&Subscription> for SubscriptionPayload {
    fn from(subscription: &Subscription) -> Self {
        Self {
            id: subscription.id,
            user_id: subscription.user_id.clone(),
            community_id: subscription.community_id,
        }
    }
}

impl CreateCommunityPayload {
    pub fn to_new_community(&self) -> NewCommunity {
        NewCommunity {
            title: self.title.clone(),
            description: self.description.clone(),
            owner_id: self.owner_id.clone(),
            image_url: self.image_url.clone(),
            idempotency_key: self.idempotency_key.clone(),
        }
    }
}

fn parse<T: DeserializeOwned>(
    kind: MutationKind,
    payload: &MutationPayload,
) -> Result<T, MutationDecodeError> {
    serde_json::from_value(payload.to_value()).map_err(|err| MutationDecodeError::InvalidPayload {
        kind,
        reason: err.to_string(),
    })
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}

fn require_positive(field: &str, value: i64) -> Result<(), String> {
    if value <= 0 {
        return Err(format!("{field} must be positive"));
    }
    Ok(())
}
