use crate::application::ports::repositories::Repositories;
use crate::application::ports::session::SessionProvider;
use crate::domain::entities::offline::{Mutation, MutationDecodeError, QueuedMutation};
use crate::domain::value_objects::offline::MutationKind;
use crate::shared::config::AppMode;
use crate::shared::error::AppError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown queued write: {0}")]
    UnknownMutation(String),

    #[error("Invalid payload for {kind}: {reason}")]
    InvalidPayload { kind: MutationKind, reason: String },

    #[error("Remote write failed: {0}")]
    Remote(#[source] AppError),
}

impl DispatchError {
    /// 再試行しても成功しない項目かどうか
    pub fn is_poison(&self) -> bool {
        !matches!(self, DispatchError::Remote(_))
    }
}

impl From<MutationDecodeError> for DispatchError {
    fn from(err: MutationDecodeError) -> Self {
        match err {
            MutationDecodeError::UnknownType(name) => DispatchError::UnknownMutation(name),
            MutationDecodeError::InvalidPayload { kind, reason } => {
                DispatchError::InvalidPayload { kind, reason }
            }
        }
    }
}

impl From<AppError> for DispatchError {
    fn from(err: AppError) -> Self {
        DispatchError::Remote(err)
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Remote(inner) => inner,
            other => AppError::ValidationError(other.to_string()),
        }
    }
}

/// キューに積まれた書き込みを、ライブ操作と同じリポジトリ呼び出しへ変換する
pub struct MutationDispatcher {
    repositories: Repositories,
    session: Option<Arc<dyn SessionProvider>>,
    mode: AppMode,
}

impl MutationDispatcher {
    pub fn new(
        repositories: Repositories,
        session: Option<Arc<dyn SessionProvider>>,
        mode: AppMode,
    ) -> Self {
        Self {
            repositories,
            session,
            mode,
        }
    }

    pub async fn dispatch(&self, item: &QueuedMutation) -> Result<(), DispatchError> {
        let mutation = Mutation::decode(&item.mutation_type, &item.payload)?;

        tracing::debug!(
            target: "offline::dispatch",
            mutation_id = %item.id,
            kind = %mutation.kind(),
            "dispatching queued write"
        );

        self.execute(mutation).await
    }

    /// デコード済みのミューテーションを実行する
    pub async fn execute(&self, mutation: Mutation) -> Result<(), DispatchError> {
        let repos = &self.repositories;
        match mutation {
            Mutation::CreatePost(payload) => {
                self.ensure_session().await?;
                repos
                    .posts
                    .save_post(&payload.to_new_post(), payload.image_uri.as_deref())
                    .await?;
            }
            Mutation::AddComment(payload) => {
                repos.comments.save_comment(&payload.to_new_comment()).await?;
            }
            Mutation::LikePost(target) => {
                repos.posts.like_post(target.post_id, &target.user_id).await?;
            }
            Mutation::UnlikePost(target) => {
                repos
                    .posts
                    .dislike_post(target.post_id, &target.user_id)
                    .await?;
            }
            Mutation::SavePost(target) => {
                repos
                    .posts
                    .bookmark_post(target.post_id, &target.user_id)
                    .await?;
            }
            Mutation::UnsavePost(target) => {
                repos
                    .posts
                    .unbookmark_post(target.post_id, &target.user_id)
                    .await?;
            }
            Mutation::SubscribeCommunity(payload) => {
                repos
                    .communities
                    .subscribe(&payload.to_subscription())
                    .await?;
            }
            Mutation::UnsubscribeCommunity(payload) => {
                repos
                    .communities
                    .unsubscribe(&payload.to_subscription())
                    .await?;
            }
            Mutation::CreateCommunity(payload) => {
                self.ensure_session().await?;
                repos
                    .communities
                    .save_community(&payload.to_new_community(), payload.image_uri.as_deref())
                    .await?;
            }
        }
        Ok(())
    }

    // モックモードはセッション無しでも作成できる
    async fn ensure_session(&self) -> Result<(), DispatchError> {
        if self.mode == AppMode::Mock {
            return Ok(());
        }
        let Some(provider) = &self.session else {
            tracing::warn!(
                target: "offline::dispatch",
                "live create attempted without a session provider"
            );
            return Err(DispatchError::Remote(AppError::Unauthorized(
                "No session provider configured".to_string(),
            )));
        };
        if provider.current_session().await.is_none() {
            return Err(DispatchError::Remote(AppError::Unauthorized(
                "No active session".to_string(),
            )));
        }
        Ok(())
    }
}
