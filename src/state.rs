use crate::application::ports::connectivity::ConnectivityProbe;
use crate::application::ports::offline_images::OfflineImageStore;
use crate::application::ports::offline_store::{KeyValueStore, MutationQueue};
use crate::application::ports::repositories::Repositories;
use crate::application::ports::session::{LifecycleEvent, SessionProvider};
use crate::application::services::{
    CommunityInteractionService, MutationDispatcher, PostInteractionService,
};
use crate::domain::entities::offline::SyncTrigger;
use crate::infrastructure::cache::LocalCache;
use crate::infrastructure::connectivity::AlwaysOnline;
use crate::infrastructure::offline::{
    DEAD_LETTER_KEY, FileOfflineImageStore, PersistedMutationQueue, QueueSyncJob,
    SyncLifecycleListener, SyncRunOutcome,
};
use crate::infrastructure::repositories::mock_repositories;
use crate::infrastructure::storage::open_store;
use crate::shared::config::{AppConfig, AppMode};
use crate::shared::error::AppError;
use std::sync::Arc;
use tokio::sync::broadcast;

const LIFECYCLE_CHANNEL_CAPACITY: usize = 32;

/// アプリケーション全体の状態を管理する構造体
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn KeyValueStore>,
    pub queue: Arc<dyn MutationQueue>,
    pub dead_letters: Arc<dyn MutationQueue>,
    pub sync_job: Arc<QueueSyncJob>,
    pub cache: Arc<LocalCache>,
    pub post_service: Arc<PostInteractionService>,
    pub community_service: Arc<CommunityInteractionService>,
    lifecycle_tx: broadcast::Sender<LifecycleEvent>,
}

impl AppState {
    pub async fn new(
        config: AppConfig,
        repositories: Repositories,
        connectivity: Arc<dyn ConnectivityProbe>,
        session: Option<Arc<dyn SessionProvider>>,
    ) -> anyhow::Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

        // モックモードは常にオンライン
        let connectivity: Arc<dyn ConnectivityProbe> = match config.mode {
            AppMode::Mock => Arc::new(AlwaysOnline),
            AppMode::Live => connectivity,
        };

        let store = open_store(&config.storage).await?;
        let queue: Arc<dyn MutationQueue> = Arc::new(PersistedMutationQueue::new(store.clone()));
        let dead_letters: Arc<dyn MutationQueue> =
            Arc::new(PersistedMutationQueue::with_key(store.clone(), DEAD_LETTER_KEY));

        let dispatcher = Arc::new(MutationDispatcher::new(
            repositories.clone(),
            session,
            config.mode,
        ));
        let sync_job = QueueSyncJob::new(
            queue.clone(),
            dead_letters.clone(),
            dispatcher,
            connectivity.clone(),
            config.sync.poison_policy,
        );

        let cache = Arc::new(LocalCache::new());
        let images: Arc<dyn OfflineImageStore> = Arc::new(FileOfflineImageStore::new(
            config.storage.offline_images_dir(),
        ));
        let post_service = Arc::new(PostInteractionService::new(
            repositories.clone(),
            cache.clone(),
            queue.clone(),
            connectivity.clone(),
            images.clone(),
        ));
        let community_service = Arc::new(CommunityInteractionService::new(
            repositories,
            cache.clone(),
            queue.clone(),
            connectivity,
            images,
        ));

        let (lifecycle_tx, lifecycle_rx) = broadcast::channel(LIFECYCLE_CHANNEL_CAPACITY);
        let listener = Arc::new(SyncLifecycleListener::new(
            sync_job.clone(),
            store.clone(),
            config.sync.clone(),
        ));
        listener.spawn(lifecycle_rx);

        tracing::info!(
            target: "offline::state",
            mode = ?config.mode,
            backend = ?config.storage.backend,
            "offline write pipeline ready"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            queue,
            dead_letters,
            sync_job,
            cache,
            post_service,
            community_service,
            lifecycle_tx,
        })
    }

    /// モックリポジトリで組み立てる
    pub async fn mock(mut config: AppConfig) -> anyhow::Result<Self> {
        config.mode = AppMode::Mock;
        Self::new(config, mock_repositories(), Arc::new(AlwaysOnline), None).await
    }

    /// セッション／接続イベントを同期リスナーへ流す
    pub fn publish(&self, event: LifecycleEvent) {
        if self.lifecycle_tx.send(event).is_err() {
            tracing::warn!(target: "offline::state", "lifecycle listener is not running");
        }
    }

    /// 診断用の手動同期
    pub async fn sync_now(&self) -> Result<SyncRunOutcome, AppError> {
        self.sync_job.run(SyncTrigger::Manual).await
    }
}
