pub mod entities;
pub mod value_objects;

pub use entities::{Comment, Community, NewComment, NewCommunity, NewPost, Post, Subscription};
pub use value_objects::{MutationId, MutationKind, MutationPayload, MutationType};
