use super::optimistic::{InFlightSet, apply_optimistic_subscription};
use super::post_interaction_service::{InteractionOutcome, enqueue, require_user};
use crate::application::ports::cache::CommunityStateStore;
use crate::application::ports::connectivity::ConnectivityProbe;
use crate::application::ports::offline_images::OfflineImageStore;
use crate::application::ports::offline_store::MutationQueue;
use crate::application::ports::repositories::Repositories;
use crate::domain::entities::offline::{CreateCommunityPayload, Mutation, SubscriptionPayload};
use crate::domain::entities::{Community, NewCommunity, Subscription};
use crate::shared::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CommunityDraft {
    pub title: String,
    pub description: String,
    pub owner_id: String,
    pub image_uri: Option<String>,
}

pub struct CommunityInteractionService {
    repositories: Repositories,
    cache: Arc<dyn CommunityStateStore>,
    queue: Arc<dyn MutationQueue>,
    connectivity: Arc<dyn ConnectivityProbe>,
    images: Arc<dyn OfflineImageStore>,
    in_flight: Arc<InFlightSet<i64>>,
}

impl CommunityInteractionService {
    pub fn new(
        repositories: Repositories,
        cache: Arc<dyn CommunityStateStore>,
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
            in_flight: InFlightSet::new(),
        }
    }

    /// 現在の購読状態を反転する。成功時はリモートが返した購読で置き換える
    pub async fn toggle_subscription(
        &self,
        user_id: &str,
        community_id: i64,
    ) -> Result<InteractionOutcome<Option<Subscription>>, AppError> {
        require_user(user_id)?;
        let Some(_in_flight) = self.in_flight.try_acquire(community_id) else {
            return Ok(InteractionOutcome::Suppressed);
        };

        let current = self.cache.membership(community_id).subscription;
        let next_subscribed = current.is_none();
        let update = apply_optimistic_subscription(
            &self.cache,
            community_id,
            current.as_ref(),
            next_subscribed,
            user_id,
        );

        if !self.connectivity.is_connected() {
            let payload = SubscriptionPayload {
                id: current.as_ref().map(|s| s.id).unwrap_or(0),
                user_id: user_id.to_string(),
                community_id,
            };
            let mutation = if next_subscribed {
                Mutation::SubscribeCommunity(payload)
            } else {
                Mutation::UnsubscribeCommunity(payload)
            };
            return match enqueue(self.queue.as_ref(), &mutation).await {
                Ok(queued) => Ok(InteractionOutcome::Queued(queued)),
                Err(err) => {
                    update.rollback.run();
                    Err(err)
                }
            };
        }

        let result = if next_subscribed {
            self.repositories
                .communities
                .subscribe(&Subscription::new(0, user_id, community_id))
                .await
                .map(Some)
        } else {
            let existing = current
                .clone()
                .unwrap_or_else(|| Subscription::new(0, user_id, community_id));
            self.repositories
                .communities
                .unsubscribe(&existing)
                .await
                .map(|()| None)
        };

        match result {
            Ok(subscription) => {
                self.cache
                    .set_subscription(community_id, subscription.clone());
                Ok(InteractionOutcome::Applied(subscription))
            }
            Err(err) => {
                tracing::warn!(
                    target: "offline::interaction",
                    community_id,
                    error = %err,
                    "subscription toggle failed; rolled back"
                );
                update.rollback.run();
                Err(err)
            }
        }
    }

    pub async fn create_community(
        &self,
        draft: CommunityDraft,
    ) -> Result<InteractionOutcome<Community>, AppError> {
        require_user(&draft.owner_id)?;
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::ValidationError("Community title is required".to_string()));
        }
        let description = draft.description.trim().to_string();

        if !self.connectivity.is_connected() {
            let image_uri = match &draft.image_uri {
                Some(uri) => Some(self.images.persist(uri).await),
                None => None,
            };
            let mutation = Mutation::CreateCommunity(CreateCommunityPayload {
                title,
                description,
                owner_id: draft.owner_id,
                image_url: None,
                image_uri,
                idempotency_key: Some(Uuid::new_v4().to_string()),
            });
            let queued = enqueue(self.queue.as_ref(), &mutation).await?;
            return Ok(InteractionOutcome::Queued(queued));
        }

        let community = NewCommunity {
            title,
            description,
            owner_id: draft.owner_id,
            image_url: None,
            idempotency_key: None,
        };
        let created = self
            .repositories
            .communities
            .save_community(&community, draft.image_uri.as_deref())
            .await?;
        Ok(InteractionOutcome::Applied(created))
    }
}
