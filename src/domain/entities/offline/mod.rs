pub mod mutation;
pub mod queued_mutation;
pub mod sync_report;

pub use mutation::{
    AddCommentPayload, CreateCommunityPayload, CreatePostPayload, Mutation, MutationDecodeError,
    PostTargetPayload, SubscriptionPayload,
};
pub use queued_mutation::QueuedMutation;
pub use sync_report::{SyncHalt, SyncReport, SyncTrigger};
