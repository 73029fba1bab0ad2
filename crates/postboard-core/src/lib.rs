//! Postboard Core - Domain records, storage traits, and shared types
//!
//! This crate defines the core abstractions used by the Postboard API:
//! - User and post records
//! - Common error types
//! - Storage traits with in-memory and PostgreSQL backends
//! - Configuration management

pub mod config;
pub mod store;

pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, FeedConfig, LoggingConfig, ServerConfig,
    StorageConfig,
};
pub use store::{MemoryStore, PgStore, PostStore, Store, UserStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for storage operations
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Status every new account starts with
pub const DEFAULT_STATUS: &str = "I am new!";

// ============================================================================
// Users
// ============================================================================

/// User account record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Unique, used for login
    pub email: String,

    pub name: String,

    /// Argon2 PHC string, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub status: String,

    /// Ids of the posts this user created, oldest first
    pub posts: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a user; the store assigns the rest
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

impl User {
    /// Build a fresh user record from signup data
    pub fn from_new(new: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            status: DEFAULT_STATUS.to_string(),
            posts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a post id unless it is already listed
    pub fn add_post(&mut self, post_id: Uuid) {
        if !self.posts.contains(&post_id) {
            self.posts.push(post_id);
        }
        self.updated_at = Utc::now();
    }

    /// Remove a post id; returns whether it was listed
    pub fn remove_post(&mut self, post_id: Uuid) -> bool {
        let before = self.posts.len();
        self.posts.retain(|id| *id != post_id);
        self.updated_at = Utc::now();
        self.posts.len() != before
    }

    pub fn summary(&self) -> CreatorSummary {
        CreatorSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

// ============================================================================
// Posts
// ============================================================================

/// Post record as persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,

    /// Relative path handed out by the image store
    pub image_url: String,

    /// Owner; never changes after creation
    pub creator: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub creator: Uuid,
}

impl Post {
    pub fn from_new(new: NewPost) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: new.title,
            content: new.content,
            image_url: new.image_url,
            creator: new.creator,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.creator == user_id
    }

    pub fn with_creator(self, creator: CreatorSummary) -> PostWithCreator {
        PostWithCreator {
            id: self.id,
            title: self.title,
            content: self.content,
            image_url: self.image_url,
            creator,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// The owner fields exposed alongside a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatorSummary {
    pub id: Uuid,
    pub name: String,
}

/// A post with its creator expanded to `{id, name}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostWithCreator {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub creator: CreatorSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
