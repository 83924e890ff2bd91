pub mod mock;

pub use mock::{
    MockCommentRepository, MockCommunityRepository, MockPostRepository, mock_repositories,
};
