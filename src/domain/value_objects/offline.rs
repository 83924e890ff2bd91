pub mod mutation_id;
pub mod mutation_type;
pub mod payload;

pub use mutation_id::MutationId;
pub use mutation_type::{MutationKind, MutationType, UNREADABLE_RECORD_TYPE};
pub use payload::MutationPayload;
