mod common;

use common::{USER_ID, setup_pipeline};
use feedline_lib::{AppError, InteractionOutcome};
use feedline_lib::application::ports::cache::{CommunityStateStore, PostStateStore};
use feedline_lib::application::ports::offline_store::MutationQueue;
use feedline_lib::domain::entities::{CommunityMembership, Post, Subscription};
use feedline_lib::shared::ErrorClass;

fn saved_post(id: i64) -> Post {
    Post::new(id, format!("post {id}"), 1, "author").with_saved(true)
}

#[tokio::test]
async fn failed_like_restores_the_cached_post() {
    let ctx = setup_pipeline(true).await;
    let post = Post::new(1, "hello", 1, "author").with_likes(3, false);
    ctx.state.cache.upsert_posts(vec![post.clone()]);
    ctx.repos.fail_post(1);

    let err = ctx
        .state
        .post_service
        .toggle_like(USER_ID, &post)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Network(_)));
    assert_eq!(err.class(), ErrorClass::Remote);

    let cached = ctx.state.cache.post(1).expect("cached post");
    assert!(!cached.is_liked);
    assert_eq!(cached.likes_count, 3);
}

#[tokio::test]
async fn failed_unsave_puts_the_post_back_at_its_old_position() {
    let ctx = setup_pipeline(true).await;
    ctx.state
        .cache
        .set_saved_posts(USER_ID, vec![saved_post(1), saved_post(5), saved_post(2)]);
    ctx.repos.fail_post(5);

    let post = ctx.state.cache.post(5).expect("cached post");
    assert!(ctx.state.post_service.toggle_save(USER_ID, &post).await.is_err());

    assert_eq!(ctx.state.cache.saved_ids(USER_ID), vec![1, 5, 2]);
    assert!(ctx.state.cache.post(5).expect("cached post").is_saved);
}

#[tokio::test]
async fn offline_save_goes_to_the_front_of_the_saved_list() {
    let ctx = setup_pipeline(false).await;
    ctx.state
        .cache
        .set_saved_posts(USER_ID, vec![saved_post(1), saved_post(2)]);
    let post = Post::new(9, "new", 1, "author");
    ctx.state.cache.upsert_posts(vec![post.clone()]);

    let outcome = ctx.state.post_service.toggle_save(USER_ID, &post).await.unwrap();
    let InteractionOutcome::Queued(queued) = outcome else {
        panic!("offline save should be queued");
    };
    assert_eq!(queued.mutation_type.as_str(), "save_post");
    assert_eq!(ctx.state.cache.saved_ids(USER_ID), vec![9, 1, 2]);
    assert!(ctx.repos.calls().is_empty());
}

#[tokio::test]
async fn second_toggle_while_first_is_pending_is_suppressed() {
    let ctx = setup_pipeline(true).await;
    let post = Post::new(4, "hello", 1, "author");
    ctx.state.cache.upsert_posts(vec![post.clone()]);
    let (entered, release) = ctx.repos.hold();

    let service = ctx.state.post_service.clone();
    let first_post = post.clone();
    let first =
        tokio::spawn(async move { service.toggle_like(USER_ID, &first_post).await });
    entered.notified().await;

    let second = ctx.state.post_service.toggle_like(USER_ID, &post).await.unwrap();
    assert_eq!(second, InteractionOutcome::Suppressed);

    release.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first, InteractionOutcome::Applied(()));
    assert_eq!(ctx.repos.calls(), vec!["like_post(4,u1)"]);

    let cached = ctx.state.cache.post(4).expect("cached post");
    assert!(cached.is_liked);
    assert_eq!(cached.likes_count, 1);

    // 完了後は再びトグルできる
    let again = ctx.state.post_service.toggle_like(USER_ID, &cached).await.unwrap();
    assert_eq!(again, InteractionOutcome::Applied(()));
}

#[tokio::test]
async fn subscription_takes_the_remote_record_on_success() {
    let ctx = setup_pipeline(true).await;
    ctx.state.cache.set_membership(
        3,
        CommunityMembership {
            subscription: None,
            subscribers_count: 10,
        },
    );

    let outcome = ctx
        .state
        .community_service
        .toggle_subscription(USER_ID, 3)
        .await
        .unwrap();
    let expected = Subscription::new(7, USER_ID, 3);
    assert_eq!(outcome, InteractionOutcome::Applied(Some(expected.clone())));

    let membership = ctx.state.cache.membership(3);
    assert_eq!(membership.subscription, Some(expected));
    assert_eq!(membership.subscribers_count, 11);
}

#[tokio::test]
async fn offline_unsubscribe_queues_the_known_subscription_id() {
    let ctx = setup_pipeline(false).await;
    ctx.state.cache.set_membership(
        3,
        CommunityMembership {
            subscription: Some(Subscription::new(42, USER_ID, 3)),
            subscribers_count: 5,
        },
    );

    let outcome = ctx
        .state
        .community_service
        .toggle_subscription(USER_ID, 3)
        .await
        .unwrap();
    assert!(outcome.is_queued());

    let pending = ctx.state.queue.peek().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].mutation_type.as_str(), "unsubscribe_community");
    assert_eq!(pending[0].payload.get("id"), Some(&serde_json::json!(42)));

    let membership = ctx.state.cache.membership(3);
    assert_eq!(membership.subscription, None);
    assert_eq!(membership.subscribers_count, 4);
}

#[tokio::test]
async fn blank_user_is_rejected_before_touching_the_cache() {
    let ctx = setup_pipeline(true).await;
    let post = Post::new(6, "hello", 1, "author");
    ctx.state.cache.upsert_posts(vec![post.clone()]);

    let err = ctx.state.post_service.toggle_like("  ", &post).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert!(!ctx.state.cache.post(6).expect("cached post").is_liked);
}
