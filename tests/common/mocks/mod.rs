pub mod failing_store;
pub mod recording_repository;

pub use failing_store::*;
pub use recording_repository::*;
