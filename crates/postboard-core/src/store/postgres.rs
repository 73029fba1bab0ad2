//! PostgreSQL store
//!
//! Users and posts live in two tables. A user's post list is a `uuid[]`
//! column kept in creation order.

use super::{PostStore, UserStore};
use crate::{
    CoreError, CreatorSummary, NewPost, NewUser, Post, PostWithCreator, Result, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            UUID PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    status        TEXT NOT NULL,
    posts         UUID[] NOT NULL DEFAULT '{}',
    created_at    TIMESTAMPTZ NOT NULL,
    updated_at    TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS posts (
    id         UUID PRIMARY KEY,
    title      TEXT NOT NULL,
    content    TEXT NOT NULL,
    image_url  TEXT NOT NULL,
    creator    UUID NOT NULL REFERENCES users (id),
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS posts_created_at_idx ON posts (created_at, id);
"#;

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store connection
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| CoreError::DatabaseError(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| CoreError::DatabaseError(format!("Failed to apply schema: {e}")))?;

        tracing::info!("Database schema is up to date");
        Ok(())
    }
}

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    status: String,
    posts: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            status: row.status,
            posts: row.posts,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Post row from database
#[derive(Debug, FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    content: String,
    image_url: String,
    creator: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            image_url: row.image_url,
            creator: row.creator,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Post row joined with its creator's name
#[derive(Debug, FromRow)]
struct PostCreatorRow {
    id: Uuid,
    title: String,
    content: String,
    image_url: String,
    creator: Uuid,
    creator_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostCreatorRow> for PostWithCreator {
    fn from(row: PostCreatorRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            image_url: row.image_url,
            creator: CreatorSummary {
                id: row.creator,
                name: row.creator_name,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const POST_WITH_CREATOR_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.content, p.image_url, p.creator,
        u.name AS creator_name, p.created_at, p.updated_at
    FROM posts p
    JOIN users u ON u.id = p.creator
"#;

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let user = User::from_new(user);

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, status, posts, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.status)
        .bind(&user.posts)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CoreError::DuplicateEmail(user.email.clone())
            }
            e => CoreError::DatabaseError(format!("Failed to create user: {e}")),
        })?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, email, name, password_hash, status, posts, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::DatabaseError(format!("Failed to get user: {e}")))?;

        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, email, name, password_hash, status, posts, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::DatabaseError(format!("Failed to get user: {e}")))?;

        Ok(row.map(User::from))
    }

    async fn save_user(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = $2,
                status = $3,
                posts = $4,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.status)
        .bind(&user.posts)
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::DatabaseError(format!("Failed to update user: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("user {}", user.id)));
        }
        Ok(())
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let post = Post::from_new(post);

        sqlx::query(
            r#"
            INSERT INTO posts (id, title, content, image_url, creator, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(post.creator)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::DatabaseError(format!("Failed to create post: {e}")))?;

        Ok(post)
    }

    async fn find_post_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let row: Option<PostRow> = sqlx::query_as(
            r#"
            SELECT id, title, content, image_url, creator, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::DatabaseError(format!("Failed to get post: {e}")))?;

        Ok(row.map(Post::from))
    }

    async fn find_post_with_creator(&self, id: Uuid) -> Result<Option<PostWithCreator>> {
        let query = format!("{POST_WITH_CREATOR_SELECT} WHERE p.id = $1");
        let row: Option<PostCreatorRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CoreError::DatabaseError(format!("Failed to get post: {e}")))?;

        Ok(row.map(PostWithCreator::from))
    }

    async fn save_post(&self, post: &Post) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE posts SET
                title = $2,
                content = $3,
                image_url = $4,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.image_url)
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::DatabaseError(format!("Failed to update post: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("post {}", post.id)));
        }
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| CoreError::DatabaseError(format!("Failed to delete post: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_posts(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CoreError::DatabaseError(format!("Failed to count posts: {e}")))?;

        Ok(count.max(0) as u64)
    }

    async fn list_posts(&self, skip: u64, limit: u64) -> Result<Vec<PostWithCreator>> {
        let query =
            format!("{POST_WITH_CREATOR_SELECT} ORDER BY p.created_at, p.id LIMIT $1 OFFSET $2");
        let rows: Vec<PostCreatorRow> = sqlx::query_as(&query)
            .bind(sql_count(limit))
            .bind(sql_count(skip))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CoreError::DatabaseError(format!("Failed to list posts: {e}")))?;

        Ok(rows.into_iter().map(PostWithCreator::from).collect())
    }
}

/// Postgres takes `BIGINT` for LIMIT and OFFSET; larger values saturate
fn sql_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
