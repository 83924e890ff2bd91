use super::sync_job::QueueSyncJob;
use crate::application::ports::offline_store::KeyValueStore;
use crate::application::ports::session::{ConnectivityEvent, LifecycleEvent, SessionEvent};
use crate::domain::entities::offline::SyncTrigger;
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

pub const QUEUE_OWNER_KEY: &str = "offline_write_queue_owner";

/// セッション／接続イベントを同期ジョブのトリガーへ変換する
pub struct SyncLifecycleListener {
    job: Arc<QueueSyncJob>,
    store: Arc<dyn KeyValueStore>,
    config: SyncConfig,
}

impl SyncLifecycleListener {
    pub fn new(job: Arc<QueueSyncJob>, store: Arc<dyn KeyValueStore>, config: SyncConfig) -> Self {
        Self { job, store, config }
    }

    pub fn spawn(self: Arc<Self>, mut events: broadcast::Receiver<LifecycleEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    // ランは別タスクで走らせ、後続イベントの受信を止めない
                    Ok(event) => match self.handle(event).await {
                        Ok(Some(trigger)) => self.job.trigger(trigger),
                        Ok(None) => {}
                        Err(err) => {
                            tracing::error!(
                                target: "offline::lifecycle",
                                error = %err,
                                "failed to handle lifecycle event"
                            );
                        }
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            target: "offline::lifecycle",
                            skipped,
                            "lifecycle listener lagged behind"
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!(target: "offline::lifecycle", "lifecycle listener stopped");
        })
    }

    /// キュー所有者の更新やクリアを行い、必要なら起動すべきトリガーを返す
    pub async fn handle(&self, event: LifecycleEvent) -> Result<Option<SyncTrigger>, AppError> {
        match event {
            LifecycleEvent::Session(SessionEvent::Established { user_id, banned }) => {
                if banned {
                    tracing::debug!(
                        target: "offline::lifecycle",
                        user_id = %user_id,
                        "suspended session; queue left untouched"
                    );
                    return Ok(None);
                }
                self.claim_queue(&user_id).await?;
                if !self.config.sync_on_session {
                    return Ok(None);
                }
                Ok(Some(SyncTrigger::SessionEstablished))
            }
            LifecycleEvent::Session(SessionEvent::Cleared) => {
                if self.config.clear_queue_on_sign_out {
                    self.job.queue().clear().await?;
                    self.store.remove_item(QUEUE_OWNER_KEY).await?;
                    tracing::info!(target: "offline::lifecycle", "queue cleared on sign-out");
                }
                Ok(None)
            }
            LifecycleEvent::Connectivity(ConnectivityEvent::Regained) => {
                if !self.config.drain_on_reconnect {
                    return Ok(None);
                }
                Ok(Some(SyncTrigger::ConnectivityRegained))
            }
            LifecycleEvent::Connectivity(ConnectivityEvent::Lost) => Ok(None),
        }
    }

    // 別ユーザーの書き込みを送信しない
    async fn claim_queue(&self, user_id: &str) -> Result<(), AppError> {
        let owner = self.store.get_item(QUEUE_OWNER_KEY).await?;
        if let Some(previous) = owner.as_deref()
            && previous != user_id
        {
            self.job.queue().clear().await?;
            tracing::warn!(
                target: "offline::lifecycle",
                previous = %previous,
                current = %user_id,
                "queue belonged to another user; cleared"
            );
        }
        if owner.as_deref() != Some(user_id) {
            self.store.set_item(QUEUE_OWNER_KEY, user_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::offline_store::MutationQueue;
    use crate::application::services::mutation_dispatcher::MutationDispatcher;
    use crate::domain::entities::offline::QueuedMutation;
    use crate::domain::value_objects::offline::{MutationId, MutationPayload, MutationType};
    use crate::infrastructure::connectivity::ManualConnectivity;
    use crate::infrastructure::offline::persisted_queue::{DEAD_LETTER_KEY, PersistedMutationQueue};
    use crate::infrastructure::offline::sync_job::SyncRunOutcome;
    use crate::infrastructure::repositories::mock::mock_repositories;
    use crate::infrastructure::storage::MemoryKeyValueStore;
    use crate::shared::config::{AppMode, PoisonPolicy};
    use serde_json::json;

    fn build_listener(config: SyncConfig) -> (SyncLifecycleListener, Arc<MemoryKeyValueStore>) {
        let store = Arc::new(MemoryKeyValueStore::new());
        let dispatcher = Arc::new(MutationDispatcher::new(
            mock_repositories(),
            None,
            AppMode::Mock,
        ));
        let job = QueueSyncJob::new(
            Arc::new(PersistedMutationQueue::new(store.clone())),
            Arc::new(PersistedMutationQueue::with_key(store.clone(), DEAD_LETTER_KEY)),
            dispatcher,
            Arc::new(ManualConnectivity::new(false)),
            PoisonPolicy::Quarantine,
        );
        (SyncLifecycleListener::new(job, store.clone(), config), store)
    }

    fn like(id: &str) -> QueuedMutation {
        QueuedMutation::new(
            MutationId::new(id.to_string()).unwrap(),
            MutationType::new("like_post".to_string()).unwrap(),
            MutationPayload::new(json!({"postId": 1, "userId": "u1"})).unwrap(),
            0,
        )
    }

    #[tokio::test]
    async fn session_established_triggers_a_run() {
        let (listener, store) = build_listener(SyncConfig::default());
        let trigger = listener
            .handle(LifecycleEvent::session_established("u1"))
            .await
            .unwrap();
        assert_eq!(trigger, Some(SyncTrigger::SessionEstablished));

        let outcome = listener.job.run(SyncTrigger::SessionEstablished).await.unwrap();
        assert!(matches!(outcome, SyncRunOutcome::Completed(ref reports) if reports.len() == 1));
        assert_eq!(
            store.get_item(QUEUE_OWNER_KEY).await.unwrap().as_deref(),
            Some("u1")
        );
    }

    #[tokio::test]
    async fn banned_session_does_not_trigger() {
        let (listener, _) = build_listener(SyncConfig::default());
        let outcome = listener
            .handle(LifecycleEvent::Session(SessionEvent::Established {
                user_id: "u1".into(),
                banned: true,
            }))
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn different_user_clears_stale_queue() {
        let (listener, _) = build_listener(SyncConfig::default());
        listener
            .handle(LifecycleEvent::session_established("u1"))
            .await
            .unwrap();
        listener.job.queue().enqueue(like("a")).await.unwrap();

        listener
            .handle(LifecycleEvent::session_established("u1"))
            .await
            .unwrap();
        assert_eq!(listener.job.queue().len().await.unwrap(), 1);

        listener
            .handle(LifecycleEvent::session_established("u2"))
            .await
            .unwrap();
        assert_eq!(listener.job.queue().len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sign_out_clears_queue_when_configured() {
        let (listener, _) = build_listener(SyncConfig::default());
        listener.job.queue().enqueue(like("a")).await.unwrap();
        listener
            .handle(LifecycleEvent::session_cleared())
            .await
            .unwrap();
        assert!(listener.job.queue().peek().await.unwrap().is_empty());

        let (keeping, _) = listener_keeping_queue();
        keeping.job.queue().enqueue(like("b")).await.unwrap();
        keeping
            .handle(LifecycleEvent::session_cleared())
            .await
            .unwrap();
        assert_eq!(keeping.job.queue().len().await.unwrap(), 1);
    }

    fn listener_keeping_queue() -> (SyncLifecycleListener, Arc<MemoryKeyValueStore>) {
        build_listener(SyncConfig {
            clear_queue_on_sign_out: false,
            ..SyncConfig::default()
        })
    }

    #[tokio::test]
    async fn reconnect_trigger_is_opt_in() {
        let (listener, _) = build_listener(SyncConfig::default());
        let regained = LifecycleEvent::Connectivity(ConnectivityEvent::Regained);
        assert!(listener.handle(regained.clone()).await.unwrap().is_none());

        let (opted_in, _) = build_listener(SyncConfig {
            drain_on_reconnect: true,
            ..SyncConfig::default()
        });
        assert_eq!(
            opted_in.handle(regained).await.unwrap(),
            Some(SyncTrigger::ConnectivityRegained)
        );
    }
}
