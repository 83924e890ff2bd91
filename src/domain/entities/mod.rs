pub mod comment;
pub mod community;
pub mod offline;
pub mod post;

pub use comment::{Comment, NewComment};
pub use community::{Community, CommunityMembership, NewCommunity, Subscription};
pub use post::{ModerationStatus, NewPost, Post, PostPatch};
