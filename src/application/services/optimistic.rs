use crate::application::ports::cache::{CommunityStateStore, PostStateStore};
use crate::domain::entities::{Post, PostPatch, Subscription};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// 楽観的更新を元に戻す処理。取り消し値は適用時点で値として捕捉済み
pub struct Rollback(Option<Box<dyn FnOnce() + Send>>);

impl Rollback {
    pub fn new(undo: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(undo)))
    }

    pub fn noop() -> Self {
        Self(None)
    }

    pub fn run(mut self) {
        if let Some(undo) = self.0.take() {
            undo();
        }
    }
}

impl fmt::Debug for Rollback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rollback")
            .field(&self.0.as_ref().map(|_| "pending"))
            .finish()
    }
}

#[derive(Debug)]
pub struct OptimisticLike {
    pub next_liked: bool,
    pub previous_count: u32,
    pub rollback: Rollback,
}

#[derive(Debug)]
pub struct OptimisticSave {
    pub next_saved: bool,
    pub rollback: Rollback,
}

#[derive(Debug)]
pub struct OptimisticSubscription {
    pub next_subscribed: bool,
    pub previous_count: u32,
    pub rollback: Rollback,
}

/// いいね状態を反転し、件数を ±1（0 未満にはしない）する
pub fn apply_optimistic_like<S>(store: &Arc<S>, post: &Post) -> OptimisticLike
where
    S: PostStateStore + ?Sized + 'static,
{
    let previous_count = store
        .post(post.id)
        .map(|cached| cached.likes_count)
        .unwrap_or(post.likes_count);
    let previous_liked = post.is_liked;
    let next_liked = !previous_liked;
    let next_count = if next_liked {
        previous_count.saturating_add(1)
    } else {
        previous_count.saturating_sub(1)
    };

    store.update_post(
        post.id,
        PostPatch {
            is_liked: Some(next_liked),
            likes_count: Some(next_count),
            ..PostPatch::default()
        },
    );

    let store = Arc::clone(store);
    let post_id = post.id;
    OptimisticLike {
        next_liked,
        previous_count,
        rollback: Rollback::new(move || {
            store.update_post(
                post_id,
                PostPatch {
                    is_liked: Some(previous_liked),
                    likes_count: Some(previous_count),
                    ..PostPatch::default()
                },
            );
        }),
    }
}

/// 保存状態を反転し、ユーザーの保存済みインデックス（新しい順）も同時に更新する
pub fn apply_optimistic_save<S>(store: &Arc<S>, post: &Post, user_id: &str) -> OptimisticSave
where
    S: PostStateStore + ?Sized + 'static,
{
    let previous_saved = post.is_saved;
    let next_saved = !previous_saved;
    let previous_position = store
        .saved_ids(user_id)
        .iter()
        .position(|id| *id == post.id);

    store.update_post(
        post.id,
        PostPatch {
            is_saved: Some(next_saved),
            ..PostPatch::default()
        },
    );
    if next_saved {
        store.insert_saved(user_id, post.id, 0);
    } else {
        store.remove_saved(user_id, post.id);
    }

    let store = Arc::clone(store);
    let post_id = post.id;
    let user_id = user_id.to_string();
    OptimisticSave {
        next_saved,
        rollback: Rollback::new(move || {
            store.update_post(
                post_id,
                PostPatch {
                    is_saved: Some(previous_saved),
                    ..PostPatch::default()
                },
            );
            store.remove_saved(&user_id, post_id);
            if let Some(position) = previous_position {
                store.insert_saved(&user_id, post_id, position);
            }
        }),
    }
}

/// 購読レコードと購読者数を先に反映する
pub fn apply_optimistic_subscription<S>(
    store: &Arc<S>,
    community_id: i64,
    current: Option<&Subscription>,
    next_subscribed: bool,
    user_id: &str,
) -> OptimisticSubscription
where
    S: CommunityStateStore + ?Sized + 'static,
{
    let membership = store.membership(community_id);
    let previous_count = membership.subscribers_count;
    let previous_subscription = membership.subscription;

    let next_subscription = next_subscribed.then(|| {
        Subscription::new(
            current.map(|s| s.id).unwrap_or(0),
            user_id,
            community_id,
        )
    });
    let next_count = if next_subscribed {
        previous_count.saturating_add(1)
    } else {
        previous_count.saturating_sub(1)
    };
    store.set_subscription(community_id, next_subscription);
    store.set_subscribers_count(community_id, next_count);

    let store = Arc::clone(store);
    OptimisticSubscription {
        next_subscribed,
        previous_count,
        rollback: Rollback::new(move || {
            store.set_subscription(community_id, previous_subscription);
            store.set_subscribers_count(community_id, previous_count);
        }),
    }
}

/// 同じエンティティへの並行トグルを抑止するマーカー集合
#[derive(Debug)]
pub struct InFlightSet<K> {
    keys: Mutex<HashSet<K>>,
}

impl<K: Eq + Hash + Clone> InFlightSet<K> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            keys: Mutex::new(HashSet::new()),
        })
    }

    /// 既に処理中なら `None`
    pub fn try_acquire(self: &Arc<Self>, key: K) -> Option<InFlightGuard<K>> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            set: Arc::clone(self),
            key,
        })
    }

    pub fn contains(&self, key: &K) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

#[derive(Debug)]
pub struct InFlightGuard<K: Eq + Hash> {
    set: Arc<InFlightSet<K>>,
    key: K,
}

impl<K: Eq + Hash> Drop for InFlightGuard<K> {
    fn drop(&mut self) {
        self.set
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
