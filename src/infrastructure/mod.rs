pub mod cache;
pub mod connectivity;
pub mod offline;
pub mod repositories;
pub mod storage;

pub use cache::LocalCache;
pub use connectivity::{AlwaysOnline, ManualConnectivity};
pub use offline::{FileOfflineImageStore, PersistedMutationQueue};
pub use storage::{FileKeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
