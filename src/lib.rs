// モジュール定義
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::ports::session::{ConnectivityEvent, LifecycleEvent, SessionEvent};
pub use application::services::{InteractionOutcome, MutationDispatcher};
pub use domain::entities::offline::{Mutation, QueuedMutation, SyncReport, SyncTrigger};
pub use infrastructure::offline::{QueueSyncJob, SyncRunOutcome};
pub use shared::{AppConfig, AppError, Result};
pub use state::AppState;

/// ログ設定の初期化。`RUST_LOG` が無ければ `feedline=debug,info`
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedline=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
