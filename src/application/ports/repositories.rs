use crate::domain::entities::{
    Comment, Community, NewComment, NewCommunity, NewPost, Post, Subscription,
};
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn save_post(&self, post: &NewPost, image_uri: Option<&str>) -> Result<Post, AppError>;
    async fn like_post(&self, post_id: i64, user_id: &str) -> Result<(), AppError>;
    async fn dislike_post(&self, post_id: i64, user_id: &str) -> Result<(), AppError>;
    async fn bookmark_post(&self, post_id: i64, user_id: &str) -> Result<(), AppError>;
    async fn unbookmark_post(&self, post_id: i64, user_id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn save_comment(&self, comment: &NewComment) -> Result<Comment, AppError>;
}

#[async_trait]
pub trait CommunityRepository: Send + Sync {
    async fn save_community(
        &self,
        community: &NewCommunity,
        image_uri: Option<&str>,
    ) -> Result<Community, AppError>;
    async fn subscribe(&self, subscription: &Subscription) -> Result<Subscription, AppError>;
    async fn unsubscribe(&self, subscription: &Subscription) -> Result<(), AppError>;
}

/// ディスパッチャやサービスに注入するリポジトリ一式
#[derive(Clone)]
pub struct Repositories {
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub communities: Arc<dyn CommunityRepository>,
}

impl Repositories {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        communities: Arc<dyn CommunityRepository>,
    ) -> Self {
        Self {
            posts,
            comments,
            communities,
        }
    }
}
