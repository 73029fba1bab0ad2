//! Feed: posts, their owners and user status

pub mod service;

pub use service::{FeedService, PostInput, PostPage, StatusRequest};
