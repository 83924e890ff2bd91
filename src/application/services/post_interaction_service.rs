use super::optimistic::{InFlightSet, apply_optimistic_like, apply_optimistic_save};
use crate::application::ports::cache::PostStateStore;
use crate::application::ports::connectivity::ConnectivityProbe;
use crate::application::ports::offline_images::OfflineImageStore;
use crate::application::ports::offline_store::MutationQueue;
use crate::application::ports::repositories::Repositories;
use crate::domain::entities::offline::{
    AddCommentPayload, CreatePostPayload, Mutation, PostTargetPayload, QueuedMutation,
};
use crate::domain::entities::{Comment, ModerationStatus, NewComment, NewPost, Post, PostPatch};
use crate::shared::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

/// UI 操作の結果
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome<T = ()> {
    /// リモートへ書き込み済み
    Applied(T),
    /// オフラインのためキューに積んだ
    Queued(QueuedMutation),
    /// 同じ対象の操作が処理中
    Suppressed,
}

impl<T> InteractionOutcome<T> {
    pub fn is_queued(&self) -> bool {
        matches!(self, InteractionOutcome::Queued(_))
    }
}

#[derive(Debug, Clone)]
pub struct PostDraft {
    pub content: String,
    pub community_id: i64,
    pub user_id: String,
    pub image_uri: Option<String>,
    pub moderation_status: ModerationStatus,
}

#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub post_id: i64,
    pub user_id: String,
    pub content: String,
}

pub struct PostInteractionService {
    repositories: Repositories,
    cache: Arc<dyn PostStateStore>,
    queue: Arc<dyn MutationQueue>,
    connectivity: Arc<dyn ConnectivityProbe>,
    images: Arc<dyn OfflineImageStore>,
    likes_in_flight: Arc<InFlightSet<i64>>,
    saves_in_flight: Arc<InFlightSet<i64>>,
}

impl PostInteractionService {
    pub fn new(
        repositories: Repositories,
        cache: Arc<dyn PostStateStore>,
        queue: Arc<dyn MutationQueue>,
        connectivity: Arc<dyn ConnectivityProbe>,
        images: Arc<dyn OfflineImageStore>,
    ) -> Self {
        Self {
            repositories,
            cache,
            queue,
            connectivity,
            images,
            likes_in_flight: InFlightSet::new(),
            saves_in_flight: InFlightSet::new(),
        }
    }

    pub async fn toggle_like(
        &self,
        user_id: &str,
        post: &Post,
    ) -> Result<InteractionOutcome, AppError> {
        require_user(user_id)?;
        let Some(_in_flight) = self.likes_in_flight.try_acquire(post.id) else {
            return Ok(InteractionOutcome::Suppressed);
        };

        let like = apply_optimistic_like(&self.cache, post);
        let target = PostTargetPayload {
            post_id: post.id,
            user_id: user_id.to_string(),
        };

        if !self.connectivity.is_connected() {
            let mutation = if like.next_liked {
                Mutation::LikePost(target)
            } else {
                Mutation::UnlikePost(target)
            };
            return match enqueue(self.queue.as_ref(), &mutation).await {
                Ok(queued) => Ok(InteractionOutcome::Queued(queued)),
                Err(err) => {
                    like.rollback.run();
                    Err(err)
                }
            };
        }

        let result = if like.next_liked {
            self.repositories.posts.like_post(post.id, user_id).await
        } else {
            self.repositories.posts.dislike_post(post.id, user_id).await
        };

        match result {
            Ok(()) => Ok(InteractionOutcome::Applied(())),
            Err(err) => {
                tracing::warn!(
                    target: "offline::interaction",
                    post_id = post.id,
                    error = %err,
                    "like toggle failed; rolled back"
                );
                like.rollback.run();
                Err(err)
            }
        }
    }

    pub async fn toggle_save(
        &self,
        user_id: &str,
        post: &Post,
    ) -> Result<InteractionOutcome, AppError> {
        require_user(user_id)?;
        let Some(_in_flight) = self.saves_in_flight.try_acquire(post.id) else {
            return Ok(InteractionOutcome::Suppressed);
        };

        let save = apply_optimistic_save(&self.cache, post, user_id);
        let target = PostTargetPayload {
            post_id: post.id,
            user_id: user_id.to_string(),
        };

        if !self.connectivity.is_connected() {
            let mutation = if save.next_saved {
                Mutation::SavePost(target)
            } else {
                Mutation::UnsavePost(target)
            };
            return match enqueue(self.queue.as_ref(), &mutation).await {
                Ok(queued) => Ok(InteractionOutcome::Queued(queued)),
                Err(err) => {
                    save.rollback.run();
                    Err(err)
                }
            };
        }

        let result = if save.next_saved {
            self.repositories.posts.bookmark_post(post.id, user_id).await
        } else {
            self.repositories.posts.unbookmark_post(post.id, user_id).await
        };

        match result {
            Ok(()) => Ok(InteractionOutcome::Applied(())),
            Err(err) => {
                tracing::warn!(
                    target: "offline::interaction",
                    post_id = post.id,
                    error = %err,
                    "save toggle failed; rolled back"
                );
                save.rollback.run();
                Err(err)
            }
        }
    }

    pub async fn create_post(&self, draft: PostDraft) -> Result<InteractionOutcome<Post>, AppError> {
        require_user(&draft.user_id)?;
        let content = draft.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::ValidationError("Post content is required".to_string()));
        }
        if draft.community_id <= 0 {
            return Err(AppError::ValidationError("Community is required".to_string()));
        }

        if !self.connectivity.is_connected() {
            // キャッシュ領域の画像は送信前に消えるため保存先へ退避する
            let image_uri = match &draft.image_uri {
                Some(uri) => Some(self.images.persist(uri).await),
                None => None,
            };
            let mutation = Mutation::CreatePost(CreatePostPayload {
                content,
                community_id: draft.community_id,
                user_id: draft.user_id,
                image_uri,
                moderation_status: draft.moderation_status,
                idempotency_key: Some(Uuid::new_v4().to_string()),
            });
            let queued = enqueue(self.queue.as_ref(), &mutation).await?;
            return Ok(InteractionOutcome::Queued(queued));
        }

        let post = NewPost {
            content,
            community_id: draft.community_id,
            user_id: draft.user_id,
            moderation_status: draft.moderation_status,
            idempotency_key: None,
        };
        let created = self
            .repositories
            .posts
            .save_post(&post, draft.image_uri.as_deref())
            .await?;
        Ok(InteractionOutcome::Applied(created))
    }

    /// コメント数はオンライン・オフラインどちらでも加算する
    pub async fn add_comment(
        &self,
        draft: CommentDraft,
    ) -> Result<InteractionOutcome<Comment>, AppError> {
        require_user(&draft.user_id)?;
        let content = draft.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::ValidationError("Comment content is required".to_string()));
        }

        let outcome = if !self.connectivity.is_connected() {
            let mutation = Mutation::AddComment(AddCommentPayload {
                post_id: draft.post_id,
                user_id: draft.user_id,
                content,
                idempotency_key: Some(Uuid::new_v4().to_string()),
            });
            InteractionOutcome::Queued(enqueue(self.queue.as_ref(), &mutation).await?)
        } else {
            let comment = NewComment {
                post_id: draft.post_id,
                user_id: draft.user_id,
                content,
                idempotency_key: None,
            };
            InteractionOutcome::Applied(self.repositories.comments.save_comment(&comment).await?)
        };

        if let Some(post) = self.cache.post(draft.post_id) {
            self.cache.update_post(
                draft.post_id,
                PostPatch {
                    comments_count: Some(post.comments_count.saturating_add(1)),
                    ..PostPatch::default()
                },
            );
        }
        Ok(outcome)
    }
}

pub(crate) fn require_user(user_id: &str) -> Result<(), AppError> {
    if user_id.trim().is_empty() {
        return Err(AppError::Unauthorized("Sign in required".to_string()));
    }
    Ok(())
}

pub(crate) async fn enqueue(
    queue: &dyn MutationQueue,
    mutation: &Mutation,
) -> Result<QueuedMutation, AppError> {
    let item = QueuedMutation::from_mutation(mutation).map_err(AppError::SerializationError)?;
    let queued = queue.enqueue(item).await?;
    tracing::info!(
        target: "offline::interaction",
        mutation_id = %queued.id,
        kind = %mutation.kind(),
        "offline; write queued"
    );
    Ok(queued)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::repositories::PostRepository;
    use crate::domain::value_objects::offline::MutationKind;
    use crate::infrastructure::cache::LocalCache;
    use crate::infrastructure::connectivity::ManualConnectivity;
    use crate::infrastructure::offline::{FileOfflineImageStore, PersistedMutationQueue};
    use crate::infrastructure::repositories::mock::{
        MockCommentRepository, MockCommunityRepository, MockPostRepository,
    };
    use crate::infrastructure::storage::MemoryKeyValueStore;

    struct Fixture {
        service: PostInteractionService,
        cache: Arc<LocalCache>,
        posts: Arc<MockPostRepository>,
        queue: Arc<PersistedMutationQueue>,
        connectivity: Arc<ManualConnectivity>,
        _images: tempfile::TempDir,
    }

    async fn fixture(online: bool) -> Fixture {
        let posts = Arc::new(MockPostRepository::new());
        let cache = Arc::new(LocalCache::new());
        let queue = Arc::new(PersistedMutationQueue::new(Arc::new(MemoryKeyValueStore::new())));
        let connectivity = Arc::new(ManualConnectivity::new(online));
        let images = tempfile::tempdir().unwrap();

        let seeded = posts
            .save_post(
                &NewPost {
                    content: "seed".into(),
                    community_id: 1,
                    user_id: "author".into(),
                    moderation_status: ModerationStatus::Approved,
                    idempotency_key: None,
                },
                None,
            )
            .await
            .unwrap();
        cache.upsert_posts(vec![seeded]);

        let service = PostInteractionService::new(
            Repositories::new(
                posts.clone(),
                Arc::new(MockCommentRepository::new()),
                Arc::new(MockCommunityRepository::new()),
            ),
            cache.clone(),
            queue.clone(),
            connectivity.clone(),
            Arc::new(FileOfflineImageStore::new(images.path())),
        );
        Fixture {
            service,
            cache,
            posts,
            queue,
            connectivity,
            _images: images,
        }
    }

    #[tokio::test]
    async fn online_like_writes_through() {
        let fx = fixture(true).await;
        let post = fx.cache.post(1).unwrap();

        let outcome = fx.service.toggle_like("u1", &post).await.unwrap();
        assert_eq!(outcome, InteractionOutcome::Applied(()));
        assert!(fx.posts.is_liked(1, "u1").await);
        assert_eq!(fx.cache.post(1).unwrap().likes_count, 1);
    }

    #[tokio::test]
    async fn failed_like_rolls_back() {
        let fx = fixture(true).await;
        let missing = Post::new(99, "ghost", 1, "author").with_likes(3, false);
        fx.cache.upsert_posts(vec![missing.clone()]);

        let err = fx.service.toggle_like("u1", &missing).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let restored = fx.cache.post(99).unwrap();
        assert!(!restored.is_liked);
        assert_eq!(restored.likes_count, 3);
    }

    #[tokio::test]
    async fn offline_toggle_is_queued_without_rollback() {
        let fx = fixture(false).await;
        let post = fx.cache.post(1).unwrap();

        let outcome = fx.service.toggle_save("u1", &post).await.unwrap();
        assert!(outcome.is_queued());
        assert!(fx.cache.post(1).unwrap().is_saved);
        assert_eq!(fx.cache.saved_ids("u1"), vec![1]);

        let queued = fx.queue.peek().await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].kind(), Some(MutationKind::SavePost));
        assert!(!fx.posts.is_bookmarked(1, "u1").await);
    }

    #[tokio::test]
    async fn guest_cannot_toggle() {
        let fx = fixture(true).await;
        let post = fx.cache.post(1).unwrap();
        let err = fx.service.toggle_like("  ", &post).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(fx.cache.post(1).unwrap().likes_count, 0);
    }

    #[tokio::test]
    async fn offline_create_post_persists_image_and_enqueues() {
        let fx = fixture(false).await;
        let source = tempfile::Builder::new().suffix(".jpeg").tempfile().unwrap();
        std::fs::write(source.path(), b"jpeg").unwrap();
        let source_uri = format!("file://{}", source.path().display());

        let outcome = fx
            .service
            .create_post(PostDraft {
                content: "  offline hello ".into(),
                community_id: 1,
                user_id: "u1".into(),
                image_uri: Some(source_uri.clone()),
                moderation_status: ModerationStatus::Pending,
            })
            .await
            .unwrap();

        let InteractionOutcome::Queued(queued) = outcome else {
            panic!("expected queued outcome");
        };
        let Mutation::CreatePost(payload) =
            Mutation::decode(&queued.mutation_type, &queued.payload).unwrap()
        else {
            panic!("expected create_post");
        };
        assert_eq!(payload.content, "offline hello");
        assert_eq!(payload.moderation_status, ModerationStatus::Pending);
        assert!(payload.idempotency_key.is_some());
        let persisted = payload.image_uri.unwrap();
        assert_ne!(persisted, source_uri);
        assert!(persisted.ends_with(".jpg"));
        assert_eq!(fx.posts.post_count().await, 1);
    }

    #[tokio::test]
    async fn comment_bumps_cached_count_on_both_paths() {
        let fx = fixture(true).await;
        let draft = CommentDraft {
            post_id: 1,
            user_id: "u1".into(),
            content: "first".into(),
        };
        let online = fx.service.add_comment(draft.clone()).await.unwrap();
        assert!(matches!(online, InteractionOutcome::Applied(ref c) if c.content == "first"));

        fx.connectivity.set_connected(false);
        let offline = fx.service.add_comment(draft).await.unwrap();
        assert!(offline.is_queued());
        assert_eq!(fx.cache.post(1).unwrap().comments_count, 2);

        let blank = CommentDraft {
            post_id: 1,
            user_id: "u1".into(),
            content: "   ".into(),
        };
        assert!(matches!(
            fx.service.add_comment(blank).await,
            Err(AppError::ValidationError(_))
        ));
    }
}
