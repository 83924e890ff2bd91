pub mod config;
pub mod error;

pub use config::{AppConfig, AppMode, PoisonPolicy, StorageBackend};
pub use error::{AppError, ErrorClass, Result};
