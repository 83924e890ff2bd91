use crate::application::ports::repositories::{
    CommentRepository, CommunityRepository, PostRepository, Repositories,
};
use crate::domain::entities::{
    Comment, Community, NewComment, NewCommunity, NewPost, Post, Subscription,
};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct PostState {
    posts: HashMap<i64, Post>,
    likes: HashSet<(i64, String)>,
    bookmarks: HashSet<(i64, String)>,
    by_idempotency_key: HashMap<String, i64>,
}

/// モックモード用のインメモリ投稿リポジトリ
pub struct MockPostRepository {
    state: RwLock<PostState>,
    next_id: AtomicI64,
}

impl Default for MockPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPostRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(PostState::default()),
            next_id: AtomicI64::new(1),
        }
    }

    pub async fn get_post(&self, post_id: i64) -> Option<Post> {
        self.state.read().await.posts.get(&post_id).cloned()
    }

    pub async fn is_liked(&self, post_id: i64, user_id: &str) -> bool {
        self.state
            .read()
            .await
            .likes
            .contains(&(post_id, user_id.to_string()))
    }

    pub async fn is_bookmarked(&self, post_id: i64, user_id: &str) -> bool {
        self.state
            .read()
            .await
            .bookmarks
            .contains(&(post_id, user_id.to_string()))
    }

    pub async fn post_count(&self) -> usize {
        self.state.read().await.posts.len()
    }

    async fn ensure_post(&self, post_id: i64) -> Result<(), AppError> {
        if self.state.read().await.posts.contains_key(&post_id) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("post {post_id}")))
        }
    }
}

#[async_trait]
impl PostRepository for MockPostRepository {
    async fn save_post(&self, post: &NewPost, image_uri: Option<&str>) -> Result<Post, AppError> {
        let mut state = self.state.write().await;

        if let Some(key) = &post.idempotency_key
            && let Some(existing) = state
                .by_idempotency_key
                .get(key)
                .and_then(|id| state.posts.get(id))
        {
            return Ok(existing.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut created = Post::new(
            id,
            post.content.clone(),
            post.community_id,
            post.user_id.clone(),
        );
        created.image_url = image_uri.map(str::to_string);
        created.moderation_status = post.moderation_status;
        created.created_at = Some(Utc::now());

        if let Some(key) = &post.idempotency_key {
            state.by_idempotency_key.insert(key.clone(), id);
        }
        state.posts.insert(id, created.clone());
        Ok(created)
    }

    async fn like_post(&self, post_id: i64, user_id: &str) -> Result<(), AppError> {
        self.ensure_post(post_id).await?;
        let mut state = self.state.write().await;
        if state.likes.insert((post_id, user_id.to_string()))
            && let Some(post) = state.posts.get_mut(&post_id)
        {
            post.likes_count += 1;
        }
        Ok(())
    }

    async fn dislike_post(&self, post_id: i64, user_id: &str) -> Result<(), AppError> {
        self.ensure_post(post_id).await?;
        let mut state = self.state.write().await;
        if state.likes.remove(&(post_id, user_id.to_string()))
            && let Some(post) = state.posts.get_mut(&post_id)
        {
            post.likes_count = post.likes_count.saturating_sub(1);
        }
        Ok(())
    }

    async fn bookmark_post(&self, post_id: i64, user_id: &str) -> Result<(), AppError> {
        self.ensure_post(post_id).await?;
        self.state
            .write()
            .await
            .bookmarks
            .insert((post_id, user_id.to_string()));
        Ok(())
    }

    async fn unbookmark_post(&self, post_id: i64, user_id: &str) -> Result<(), AppError> {
        self.state
            .write()
            .await
            .bookmarks
            .remove(&(post_id, user_id.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockCommentRepository {
    comments: RwLock<Vec<Comment>>,
    by_idempotency_key: RwLock<HashMap<String, i64>>,
}

impl MockCommentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn comments_for_post(&self, post_id: i64) -> Vec<Comment> {
        self.comments
            .read()
            .await
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CommentRepository for MockCommentRepository {
    async fn save_comment(&self, comment: &NewComment) -> Result<Comment, AppError> {
        let mut keys = self.by_idempotency_key.write().await;
        let mut comments = self.comments.write().await;

        if let Some(key) = &comment.idempotency_key
            && let Some(existing) = keys
                .get(key)
                .and_then(|id| comments.iter().find(|c| c.id == *id))
        {
            return Ok(existing.clone());
        }

        let created = Comment {
            id: comments.len() as i64 + 1,
            post_id: comment.post_id,
            user_id: comment.user_id.clone(),
            content: comment.content.clone(),
            created_at: Some(Utc::now()),
        };
        if let Some(key) = &comment.idempotency_key {
            keys.insert(key.clone(), created.id);
        }
        comments.push(created.clone());
        Ok(created)
    }
}

#[derive(Default)]
pub struct MockCommunityRepository {
    communities: RwLock<Vec<Community>>,
    subscriptions: RwLock<Vec<Subscription>>,
}

impl MockCommunityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_community(self, community: Community) -> Self {
        self.communities.write().await.push(community);
        self
    }

    pub async fn subscription(&self, user_id: &str, community_id: i64) -> Option<Subscription> {
        self.subscriptions
            .read()
            .await
            .iter()
            .find(|s| s.user_id == user_id && s.community_id == community_id)
            .cloned()
    }
}

#[async_trait]
impl CommunityRepository for MockCommunityRepository {
    async fn save_community(
        &self,
        community: &NewCommunity,
        image_uri: Option<&str>,
    ) -> Result<Community, AppError> {
        let mut communities = self.communities.write().await;
        let created = Community {
            id: communities.len() as i64 + 1,
            title: community.title.clone(),
            description: community.description.clone(),
            owner_id: community.owner_id.clone(),
            image_url: image_uri
                .map(str::to_string)
                .or_else(|| community.image_url.clone()),
        };
        communities.push(created.clone());
        Ok(created)
    }

    async fn subscribe(&self, subscription: &Subscription) -> Result<Subscription, AppError> {
        let mut subscriptions = self.subscriptions.write().await;
        if let Some(existing) = subscriptions.iter().find(|s| {
            s.user_id == subscription.user_id && s.community_id == subscription.community_id
        }) {
            return Ok(existing.clone());
        }
        let created = Subscription::new(
            subscriptions.len() as i64 + 1,
            subscription.user_id.clone(),
            subscription.community_id,
        );
        subscriptions.push(created.clone());
        Ok(created)
    }

    async fn unsubscribe(&self, subscription: &Subscription) -> Result<(), AppError> {
        self.subscriptions.write().await.retain(|s| {
            !(s.user_id == subscription.user_id && s.community_id == subscription.community_id)
        });
        Ok(())
    }
}

/// モックモード用のリポジトリ一式
pub fn mock_repositories() -> Repositories {
    Repositories::new(
        Arc::new(MockPostRepository::new()),
        Arc::new(MockCommentRepository::new()),
        Arc::new(MockCommunityRepository::new()),
    )
}
