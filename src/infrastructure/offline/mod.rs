pub mod lifecycle_listener;
pub mod metrics;
pub mod offline_images;
pub mod persisted_queue;
pub mod sync_job;

pub use lifecycle_listener::{QUEUE_OWNER_KEY, SyncLifecycleListener};
pub use offline_images::FileOfflineImageStore;
pub use persisted_queue::{DEAD_LETTER_KEY, PersistedMutationQueue, QUEUE_KEY};
pub use sync_job::{QueueSyncJob, SyncRunOutcome};
