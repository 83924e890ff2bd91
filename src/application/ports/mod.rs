pub mod cache;
pub mod connectivity;
pub mod offline_images;
pub mod offline_store;
pub mod repositories;
pub mod session;
