//! In-memory store

use super::{PostStore, UserStore};
use crate::{CoreError, NewPost, NewUser, Post, PostWithCreator, Result, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Records {
    users: HashMap<Uuid, User>,
    /// Kept in insertion order
    posts: Vec<Post>,
}

impl Records {
    fn expand(&self, post: &Post) -> Result<PostWithCreator> {
        let creator = self
            .users
            .get(&post.creator)
            .ok_or_else(|| CoreError::NotFound(format!("creator of post {}", post.id)))?;
        Ok(post.clone().with_creator(creator.summary()))
    }
}

/// Process-local store backed by a read/write lock
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut records = self.records.write().await;

        if records.users.values().any(|u| u.email == user.email) {
            return Err(CoreError::DuplicateEmail(user.email));
        }

        let user = User::from_new(user);
        records.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.records.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .records
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn save_user(&self, user: &User) -> Result<()> {
        let mut records = self.records.write().await;
        let stored = records
            .users
            .get_mut(&user.id)
            .ok_or_else(|| CoreError::NotFound(format!("user {}", user.id)))?;

        stored.name = user.name.clone();
        stored.status = user.status.clone();
        stored.posts = user.posts.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let post = Post::from_new(post);
        self.records.write().await.posts.push(post.clone());
        Ok(post)
    }

    async fn find_post_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self
            .records
            .read()
            .await
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_post_with_creator(&self, id: Uuid) -> Result<Option<PostWithCreator>> {
        let records = self.records.read().await;
        records
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| records.expand(p))
            .transpose()
    }

    async fn save_post(&self, post: &Post) -> Result<()> {
        let mut records = self.records.write().await;
        let stored = records
            .posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or_else(|| CoreError::NotFound(format!("post {}", post.id)))?;

        stored.title = post.title.clone();
        stored.content = post.content.clone();
        stored.image_url = post.image_url.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let mut records = self.records.write().await;
        let before = records.posts.len();
        records.posts.retain(|p| p.id != id);
        Ok(records.posts.len() != before)
    }

    async fn count_posts(&self) -> Result<u64> {
        Ok(self.records.read().await.posts.len() as u64)
    }

    async fn list_posts(&self, skip: u64, limit: u64) -> Result<Vec<PostWithCreator>> {
        let records = self.records.read().await;
        records
            .posts
            .iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|p| records.expand(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Test".to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn new_post(creator: Uuid, title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "Some content".to_string(),
            image_url: format!("images/{title}.png"),
            creator,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@test.com")).await.unwrap();

        let result = store.insert_user(new_user("a@test.com")).await;
        assert!(matches!(result, Err(CoreError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_find_user() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@test.com")).await.unwrap();

        let by_id = store.find_user_by_id(user.id).await.unwrap().unwrap();
        let by_email = store.find_user_by_email("a@test.com").await.unwrap().unwrap();
        assert_eq!(by_id.id, by_email.id);
        assert!(store.find_user_by_email("b@test.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_user_persists_posts_and_status() {
        let store = MemoryStore::new();
        let mut user = store.insert_user(new_user("a@test.com")).await.unwrap();
        let post_id = Uuid::new_v4();

        user.add_post(post_id);
        user.status = "Busy".to_string();
        store.save_user(&user).await.unwrap();

        let stored = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.posts, vec![post_id]);
        assert_eq!(stored.status, "Busy");
    }

    #[tokio::test]
    async fn test_save_unknown_user_fails() {
        let store = MemoryStore::new();
        let user = User::from_new(new_user("ghost@test.com"));
        assert!(matches!(
            store.save_user(&user).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_posts_in_insertion_order() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@test.com")).await.unwrap();

        for title in ["first", "second", "third", "fourth", "fifth"] {
            store.insert_post(new_post(user.id, title)).await.unwrap();
        }

        assert_eq!(store.count_posts().await.unwrap(), 5);

        let page = store.list_posts(2, 2).await.unwrap();
        let titles: Vec<_> = page.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "fourth"]);
        assert_eq!(page[0].creator.id, user.id);
        assert_eq!(page[0].creator.name, "Test");

        let tail = store.list_posts(4, 2).await.unwrap();
        assert_eq!(tail.len(), 1);
        assert!(store.list_posts(10, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_delete_post() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@test.com")).await.unwrap();
        let mut post = store.insert_post(new_post(user.id, "first")).await.unwrap();

        post.title = "renamed".to_string();
        store.save_post(&post).await.unwrap();
        let stored = store.find_post_with_creator(post.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "renamed");

        assert!(store.delete_post(post.id).await.unwrap());
        assert!(!store.delete_post(post.id).await.unwrap());
        assert!(store.find_post_by_id(post.id).await.unwrap().is_none());
    }

    #[test]
    fn test_empty_store_counts_zero() {
        let store = MemoryStore::new();
        let count = tokio_test::block_on(store.count_posts()).unwrap();
        assert_eq!(count, 0);
    }
}
