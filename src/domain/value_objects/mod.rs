pub mod offline;

pub use offline::{MutationId, MutationKind, MutationPayload, MutationType};
