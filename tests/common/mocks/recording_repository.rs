use async_trait::async_trait;
use feedline_lib::application::ports::repositories::{
    CommentRepository, CommunityRepository, PostRepository, Repositories,
};
use feedline_lib::domain::entities::{
    Comment, Community, NewComment, NewCommunity, NewPost, Post, Subscription,
};
use feedline_lib::AppError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// リモート呼び出しを `name(args)` 形式で記録するテストダブル
#[derive(Default)]
pub struct RecordingRepository {
    calls: Mutex<Vec<String>>,
    failing_posts: Mutex<HashSet<i64>>,
    gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

#[allow(dead_code)]
impl RecordingRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories::new(self.clone(), self.clone(), self.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// 指定した postId への書き込みをネットワークエラーにする
    pub fn fail_post(&self, post_id: i64) {
        self.failing_posts.lock().unwrap().insert(post_id);
    }

    pub fn recover(&self) {
        self.failing_posts.lock().unwrap().clear();
    }

    /// 次の like/bookmark 呼び出しを release まで止める
    pub fn hold(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some((entered.clone(), release.clone()));
        (entered, release)
    }

    async fn post_write(&self, call: String, post_id: i64) -> Result<(), AppError> {
        let gate = self.gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            entered.notify_one();
            release.notified().await;
        }
        self.calls.lock().unwrap().push(call);
        if self.failing_posts.lock().unwrap().contains(&post_id) {
            return Err(AppError::Network(format!("post {post_id} unreachable")));
        }
        Ok(())
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PostRepository for RecordingRepository {
    async fn save_post(&self, post: &NewPost, image_uri: Option<&str>) -> Result<Post, AppError> {
        self.record(format!("save_post({},{})", post.content, image_uri.unwrap_or("-")));
        Ok(Post::new(100, post.content.clone(), post.community_id, post.user_id.clone()))
    }

    async fn like_post(&self, post_id: i64, user_id: &str) -> Result<(), AppError> {
        self.post_write(format!("like_post({post_id},{user_id})"), post_id)
            .await
    }

    async fn dislike_post(&self, post_id: i64, user_id: &str) -> Result<(), AppError> {
        self.post_write(format!("dislike_post({post_id},{user_id})"), post_id)
            .await
    }

    async fn bookmark_post(&self, post_id: i64, user_id: &str) -> Result<(), AppError> {
        self.post_write(format!("bookmark_post({post_id},{user_id})"), post_id)
            .await
    }

    async fn unbookmark_post(&self, post_id: i64, user_id: &str) -> Result<(), AppError> {
        self.post_write(format!("unbookmark_post({post_id},{user_id})"), post_id)
            .await
    }
}

#[async_trait]
impl CommentRepository for RecordingRepository {
    async fn save_comment(&self, comment: &NewComment) -> Result<Comment, AppError> {
        self.record(format!("save_comment({},{})", comment.post_id, comment.content));
        Ok(Comment {
            id: 1,
            post_id: comment.post_id,
            user_id: comment.user_id.clone(),
            content: comment.content.clone(),
            created_at: None,
        })
    }
}

#[async_trait]
impl CommunityRepository for RecordingRepository {
    async fn save_community(
        &self,
        community: &NewCommunity,
        _image_uri: Option<&str>,
    ) -> Result<Community, AppError> {
        self.record(format!("save_community({})", community.title));
        Ok(Community {
            id: 1,
            title: community.title.clone(),
            description: community.description.clone(),
            owner_id: community.owner_id.clone(),
            image_url: None,
        })
    }

    async fn subscribe(&self, subscription: &Subscription) -> Result<Subscription, AppError> {
        self.record(format!(
            "subscribe({},{})",
            subscription.user_id, subscription.community_id
        ));
        Ok(Subscription::new(
            7,
            subscription.user_id.clone(),
            subscription.community_id,
        ))
    }

    async fn unsubscribe(&self, subscription: &Subscription) -> Result<(), AppError> {
        self.record(format!(
            "unsubscribe({},{})",
            subscription.user_id, subscription.community_id
        ));
        Ok(())
    }
}
