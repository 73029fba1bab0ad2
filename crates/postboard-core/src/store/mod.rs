//! Record storage
//!
//! The API layer talks to storage only through [`UserStore`] and
//! [`PostStore`]. Two backends are provided:
//! - [`MemoryStore`]: process-local, used for development and tests
//! - [`PgStore`]: PostgreSQL via SQLx
//!
//! Neither backend couples the two record kinds transactionally; callers that
//! touch both a post and its owner do so with two independent writes.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::{NewPost, NewUser, Post, PostWithCreator, Result, User};
use async_trait::async_trait;
use uuid::Uuid;

/// User record operations
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user; fails with `DuplicateEmail` if the email is taken
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Persist name, status and post list of an existing user
    async fn save_user(&self, user: &User) -> Result<()>;
}

/// Post record operations
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: NewPost) -> Result<Post>;

    async fn find_post_by_id(&self, id: Uuid) -> Result<Option<Post>>;

    /// Fetch a post with its creator expanded to `{id, name}`
    async fn find_post_with_creator(&self, id: Uuid) -> Result<Option<PostWithCreator>>;

    /// Persist title, content and image of an existing post
    async fn save_post(&self, post: &Post) -> Result<()>;

    /// Delete a post; returns whether a record was removed
    async fn delete_post(&self, id: Uuid) -> Result<bool>;

    async fn count_posts(&self) -> Result<u64>;

    /// A page of posts in creation order with creators expanded
    async fn list_posts(&self, skip: u64, limit: u64) -> Result<Vec<PostWithCreator>>;
}

/// Full storage backend used by the API
pub trait Store: UserStore + PostStore {}

impl<T: UserStore + PostStore> Store for T {}
