pub mod community_interaction_service;
pub mod mutation_dispatcher;
pub mod optimistic;
pub mod post_interaction_service;

pub use community_interaction_service::{CommunityDraft, CommunityInteractionService};
pub use mutation_dispatcher::{DispatchError, MutationDispatcher};
pub use optimistic::{
    InFlightGuard, InFlightSet, OptimisticLike, OptimisticSave, OptimisticSubscription, Rollback,
    apply_optimistic_like, apply_optimistic_save, apply_optimistic_subscription,
};
pub use post_interaction_service::{
    CommentDraft, InteractionOutcome, PostDraft, PostInteractionService,
};
