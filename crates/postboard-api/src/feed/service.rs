//! Post lifecycle
//!
//! Creating and deleting a post touches two records: the post itself and the
//! owner's post list. The writes are sequential and not transactional.
//! A failed owner update after create is compensated by deleting the new post.
//! A failed owner update after delete is logged and reported.

use crate::audit::{audit_log, AuditEvent};
use crate::error::AppError;
use crate::realtime::{FeedEvent, FeedNotifier};
use crate::storage::{ImageStore, ImageUpload};
use chrono::Utc;
use postboard_core::{NewPost, PostWithCreator, Store};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const POST_NOT_FOUND: &str = "Could not find the requested post.";
const USER_NOT_FOUND: &str = "Could not find user.";
const FOREIGN_IMAGE: &str = "Image does not belong to this post.";

/// Title and content of a post as submitted
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct PostInput {
    #[validate(length(min = 5, message = "Title must be at least 5 characters long."))]
    #[schema(example = "First post")]
    pub title: String,

    #[validate(length(min = 5, message = "Content must be at least 5 characters long."))]
    #[schema(example = "Hello from the feed")]
    pub content: String,
}

impl PostInput {
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
        }
    }
}

/// New status text for the caller
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    #[validate(length(min = 1, message = "Status must not be empty."))]
    #[schema(example = "Feeling productive")]
    pub new_status: String,
}

/// One page of the feed
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<PostWithCreator>,
    pub total_items: u64,
}

/// Create, read, update and delete posts; read and set user status
#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn Store>,
    images: Arc<dyn ImageStore>,
    notifier: FeedNotifier,
    page_size: u64,
}

impl FeedService {
    pub fn new(
        store: Arc<dyn Store>,
        images: Arc<dyn ImageStore>,
        notifier: FeedNotifier,
        page_size: u64,
    ) -> Self {
        Self {
            store,
            images,
            notifier,
            page_size: page_size.max(1),
        }
    }

    /// List one page of posts; pages start at 1 and lower values are clamped
    pub async fn list(&self, page: Option<i64>) -> Result<PostPage, AppError> {
        let page = page.unwrap_or(1).max(1) as u64;

        let total_items = self.store.count_posts().await?;
        let skip = (page - 1).saturating_mul(self.page_size);
        let posts = self.store.list_posts(skip, self.page_size).await?;

        Ok(PostPage { posts, total_items })
    }

    /// Create a post owned by `owner` and append it to the owner's list
    pub async fn create(
        &self,
        owner: Uuid,
        input: PostInput,
        image: Option<ImageUpload>,
    ) -> Result<PostWithCreator, AppError> {
        let input = input.normalized();
        input.validate().map_err(|e| AppError::invalid_input(&e))?;

        let image = image.ok_or_else(|| AppError::validation("No image provided."))?;

        let mut user = self
            .store
            .find_user_by_id(owner)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

        let image_url = self
            .images
            .save(image)
            .await
            .map_err(|e| AppError::Unexpected(e.to_string()))?;

        let post = match self
            .store
            .insert_post(NewPost {
                title: input.title,
                content: input.content,
                image_url: image_url.clone(),
                creator: owner,
            })
            .await
        {
            Ok(post) => post,
            Err(e) => {
                self.images.remove(&image_url).await;
                return Err(e.into());
            }
        };

        user.add_post(post.id);
        if let Err(e) = self.store.save_user(&user).await {
            tracing::error!(
                post_id = %post.id,
                user_id = %owner,
                error = %e,
                "Failed to link post to its owner, rolling back"
            );
            if let Err(rollback) = self.store.delete_post(post.id).await {
                tracing::error!(post_id = %post.id, error = %rollback, "Rollback of post failed");
            }
            self.images.remove(&image_url).await;
            return Err(e.into());
        }

        let post = post.with_creator(user.summary());
        tracing::info!(post_id = %post.id, user_id = %owner, "Post created");
        self.notifier.emit(FeedEvent::Created { post: post.clone() });

        Ok(post)
    }

    pub async fn get(&self, post_id: Uuid) -> Result<PostWithCreator, AppError> {
        self.store
            .find_post_with_creator(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND.to_string()))
    }

    /// Replace title, content and image of a post owned by `requester`
    ///
    /// The image is the new upload when one is given. Otherwise the client
    /// must send back the path the post already has.
    pub async fn update(
        &self,
        post_id: Uuid,
        requester: Uuid,
        input: PostInput,
        new_image: Option<ImageUpload>,
        existing_image: Option<String>,
    ) -> Result<PostWithCreator, AppError> {
        let mut post = self
            .store
            .find_post_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND.to_string()))?;

        if !post.is_owned_by(requester) {
            return Err(self.access_denied(requester, post_id, "update"));
        }

        let input = input.normalized();
        input.validate().map_err(|e| AppError::invalid_input(&e))?;

        let existing_image = existing_image
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty());

        let uploaded = match (new_image, existing_image) {
            (Some(upload), _) => Some(
                self.images
                    .save(upload)
                    .await
                    .map_err(|e| AppError::Unexpected(e.to_string()))?,
            ),
            (None, Some(path)) if path == post.image_url => None,
            (None, Some(_)) => return Err(AppError::validation(FOREIGN_IMAGE)),
            (None, None) => return Err(AppError::validation("No file picked.")),
        };

        let replaced = uploaded
            .as_ref()
            .map(|url| std::mem::replace(&mut post.image_url, url.clone()));
        post.title = input.title;
        post.content = input.content;
        post.updated_at = Utc::now();

        if let Err(e) = self.store.save_post(&post).await {
            if let Some(url) = &uploaded {
                self.images.remove(url).await;
            }
            return Err(e.into());
        }

        // The old file goes only once nothing points at it
        if let Some(old) = replaced {
            self.images.remove(&old).await;
        }

        let post = self.get(post_id).await?;
        tracing::info!(post_id = %post_id, user_id = %requester, "Post updated");
        self.notifier.emit(FeedEvent::Updated { post: post.clone() });

        Ok(post)
    }

    /// Delete a post owned by `requester` and pull it from the owner's list
    pub async fn delete(&self, post_id: Uuid, requester: Uuid) -> Result<(), AppError> {
        let post = self
            .store
            .find_post_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND.to_string()))?;

        if !post.is_owned_by(requester) {
            return Err(self.access_denied(requester, post_id, "delete"));
        }

        self.store.delete_post(post_id).await?;
        self.images.remove(&post.image_url).await;

        if let Err(e) = self.unlink_from_owner(post.creator, post_id).await {
            tracing::error!(
                post_id = %post_id,
                user_id = %post.creator,
                error = %e,
                "Post deleted but owner's post list was not updated"
            );
            return Err(AppError::Unexpected(format!(
                "Failed to update post list of user {}: {e}",
                post.creator
            )));
        }

        tracing::info!(post_id = %post_id, user_id = %requester, "Post deleted");
        self.notifier.emit(FeedEvent::Deleted { post_id });

        Ok(())
    }

    pub async fn status(&self, user_id: Uuid) -> Result<String, AppError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;
        Ok(user.status)
    }

    pub async fn set_status(
        &self,
        user_id: Uuid,
        request: StatusRequest,
    ) -> Result<String, AppError> {
        let request = StatusRequest {
            new_status: request.new_status.trim().to_string(),
        };
        request.validate().map_err(|e| AppError::invalid_input(&e))?;

        let mut user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

        user.status = request.new_status;
        user.updated_at = Utc::now();
        self.store.save_user(&user).await?;

        Ok(user.status)
    }

    async fn unlink_from_owner(&self, owner: Uuid, post_id: Uuid) -> Result<(), AppError> {
        let mut user = self
            .store
            .find_user_by_id(owner)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

        user.remove_post(post_id);
        user.updated_at = Utc::now();
        self.store.save_user(&user).await?;
        Ok(())
    }

    fn access_denied(&self, user_id: Uuid, post_id: Uuid, action: &str) -> AppError {
        audit_log(&AuditEvent::AccessDenied {
            user_id,
            resource: format!("post:{post_id}"),
            action: action.to_string(),
        });
        AppError::Forbidden(format!("Not authorized to {action} this post."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalImageStore;
    use async_trait::async_trait;
    use axum::body::Bytes;
    use postboard_core::{
        CoreError, MemoryStore, NewUser, Post, PostStore, User, UserStore, DEFAULT_STATUS,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    struct Fixture {
        service: FeedService,
        store: Arc<MemoryStore>,
        notifier: FeedNotifier,
        dir: TempDir,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let dir = TempDir::new().unwrap();
        let notifier = FeedNotifier::default();
        let service = FeedService::new(
            store.clone(),
            Arc::new(LocalImageStore::new(dir.path())),
            notifier.clone(),
            2,
        );
        Fixture {
            service,
            store,
            notifier,
            dir,
        }
    }

    async fn add_user(store: &dyn Store, email: &str) -> User {
        store
            .insert_user(NewUser {
                email: email.to_string(),
                name: "Test".to_string(),
                password_hash: "$argon2id$stub".to_string(),
            })
            .await
            .unwrap()
    }

    fn input(title: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            content: "Some content".to_string(),
        }
    }

    fn image() -> Option<ImageUpload> {
        Some(ImageUpload {
            file_name: "pic.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: Bytes::from_static(b"png"),
        })
    }

    #[tokio::test]
    async fn test_create_links_post_to_owner() {
        let f = fixture();
        let mut events = f.notifier.subscribe();
        let user = add_user(&*f.store, "test@test.com").await;

        let post = f
            .service
            .create(user.id, input("First post"), image())
            .await
            .unwrap();

        assert_eq!(post.creator.id, user.id);
        assert_eq!(post.creator.name, "Test");
        assert!(f.dir.path().join(&post.image_url).exists());

        let owner = f.store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(owner.posts, vec![post.id]);

        assert!(matches!(events.recv().await.unwrap(), FeedEvent::Created { .. }));
    }

    #[tokio::test]
    async fn test_create_requires_valid_input_and_image() {
        let f = fixture();
        let user = add_user(&*f.store, "test@test.com").await;

        let err = f
            .service
            .create(user.id, input("  abc  "), image())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed { .. }));

        let err = f
            .service
            .create(user.id, input("First post"), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No image provided.");

        assert_eq!(f.store.count_posts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_pages_in_creation_order() {
        let f = fixture();
        let user = add_user(&*f.store, "test@test.com").await;

        let mut ids = Vec::new();
        for i in 0..5 {
            let post = f
                .service
                .create(user.id, input(&format!("Post number {i}")), image())
                .await
                .unwrap();
            ids.push(post.id);
        }

        let page = f.service.list(Some(1)).await.unwrap();
        assert_eq!(page.total_items, 5);
        assert_eq!(
            page.posts.iter().map(|p| p.id).collect::<Vec<_>>(),
            ids[0..2].to_vec()
        );

        let last = f.service.list(Some(3)).await.unwrap();
        assert_eq!(last.posts.len(), 1);
        assert_eq!(last.posts[0].id, ids[4]);

        let beyond = f.service.list(Some(4)).await.unwrap();
        assert!(beyond.posts.is_empty());
        assert_eq!(beyond.total_items, 5);

        // Missing, zero and negative pages all mean the first page
        for page in [None, Some(0), Some(-3)] {
            let clamped = f.service.list(page).await.unwrap();
            assert_eq!(clamped.posts[0].id, ids[0]);
        }
    }

    #[tokio::test]
    async fn test_get_missing_post() {
        let f = fixture();
        let err = f.service.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_by_owner_keeps_image_path() {
        let f = fixture();
        let user = add_user(&*f.store, "test@test.com").await;
        let post = f
            .service
            .create(user.id, input("First post"), image())
            .await
            .unwrap();

        let updated = f
            .service
            .update(
                post.id,
                user.id,
                input("Edited title"),
                None,
                Some(post.image_url.clone()),
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Edited title");
        assert_eq!(updated.image_url, post.image_url);
        assert!(f.dir.path().join(&post.image_url).exists());
    }

    #[tokio::test]
    async fn test_update_with_new_image_removes_old_one() {
        let f = fixture();
        let user = add_user(&*f.store, "test@test.com").await;
        let post = f
            .service
            .create(user.id, input("First post"), image())
            .await
            .unwrap();

        let updated = f
            .service
            .update(post.id, user.id, input("First post"), image(), None)
            .await
            .unwrap();

        assert_ne!(updated.image_url, post.image_url);
        assert!(!f.dir.path().join(&post.image_url).exists());
        assert!(f.dir.path().join(&updated.image_url).exists());
    }

    #[tokio::test]
    async fn test_update_without_image_is_rejected() {
        let f = fixture();
        let user = add_user(&*f.store, "test@test.com").await;
        let post = f
            .service
            .create(user.id, input("First post"), image())
            .await
            .unwrap();

        let err = f
            .service
            .update(post.id, user.id, input("First post"), None, Some("  ".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationFailed { .. }));
        assert_eq!(err.to_string(), "No file picked.");
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden_before_validation() {
        let f = fixture();
        let owner = add_user(&*f.store, "owner@test.com").await;
        let other = add_user(&*f.store, "other@test.com").await;
        let post = f
            .service
            .create(owner.id, input("First post"), image())
            .await
            .unwrap();

        // Invalid payload and no image: ownership still wins
        let err = f
            .service
            .update(post.id, other.id, input("x"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = f.service.delete(post.id, other.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let stored = f.store.find_post_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "First post");
    }

    #[tokio::test]
    async fn test_delete_unlinks_post_and_image() {
        let f = fixture();
        let mut events = f.notifier.subscribe();
        let user = add_user(&*f.store, "test@test.com").await;
        let keep = f
            .service
            .create(user.id, input("Keep this post"), image())
            .await
            .unwrap();
        let post = f
            .service
            .create(user.id, input("Delete this post"), image())
            .await
            .unwrap();

        f.service.delete(post.id, user.id).await.unwrap();

        assert!(matches!(
            f.service.get(post.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(!f.dir.path().join(&post.image_url).exists());
        let owner = f.store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(owner.posts, vec![keep.id]);

        let err = f.service.delete(post.id, user.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let mut saw_delete = false;
        while let Ok(event) = events.try_recv() {
            if let FeedEvent::Deleted { post_id } = event {
                saw_delete = post_id == post.id;
            }
        }
        assert!(saw_delete);
    }

    #[tokio::test]
    async fn test_status_round_trip() {
        let f = fixture();
        let user = add_user(&*f.store, "test@test.com").await;

        assert_eq!(f.service.status(user.id).await.unwrap(), DEFAULT_STATUS);

        let status = f
            .service
            .set_status(
                user.id,
                StatusRequest {
                    new_status: "  Busy  ".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(status, "Busy");
        assert_eq!(f.service.status(user.id).await.unwrap(), "Busy");

        let err = f
            .service
            .set_status(
                user.id,
                StatusRequest {
                    new_status: "   ".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed { .. }));

        let err = f.service.status(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_image_of_another_post() {
        let f = fixture();
        let victim = add_user(&*f.store, "victim@test.com").await;
        let attacker = add_user(&*f.store, "attacker@test.com").await;
        let victim_post = f
            .service
            .create(victim.id, input("Victim post"), image())
            .await
            .unwrap();
        let own_post = f
            .service
            .create(attacker.id, input("Attacker post"), image())
            .await
            .unwrap();

        let err = f
            .service
            .update(
                own_post.id,
                attacker.id,
                input("Attacker post"),
                None,
                Some(victim_post.image_url.clone()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed { .. }));
        assert_eq!(err.to_string(), FOREIGN_IMAGE);

        let stored = f.store.find_post_by_id(own_post.id).await.unwrap().unwrap();
        assert_eq!(stored.image_url, own_post.image_url);

        f.service.delete(own_post.id, attacker.id).await.unwrap();
        assert!(f.dir.path().join(&victim_post.image_url).exists());
        assert!(!f.dir.path().join(&own_post.image_url).exists());
    }

    /// Memory store whose writes can be switched to fail
    #[derive(Default)]
    struct FailingWrites {
        inner: MemoryStore,
        users: AtomicBool,
        posts: AtomicBool,
    }

    impl FailingWrites {
        fn check(flag: &AtomicBool) -> postboard_core::Result<()> {
            if flag.load(Ordering::SeqCst) {
                Err(CoreError::DatabaseError("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl UserStore for FailingWrites {
        async fn insert_user(&self, user: NewUser) -> postboard_core::Result<User> {
            self.inner.insert_user(user).await
        }

        async fn find_user_by_id(&self, id: Uuid) -> postboard_core::Result<Option<User>> {
            self.inner.find_user_by_id(id).await
        }

        async fn find_user_by_email(&self, email: &str) -> postboard_core::Result<Option<User>> {
            self.inner.find_user_by_email(email).await
        }

        async fn save_user(&self, user: &User) -> postboard_core::Result<()> {
            Self::check(&self.users)?;
            self.inner.save_user(user).await
        }
    }

    #[async_trait]
    impl PostStore for FailingWrites {
        async fn insert_post(&self, post: NewPost) -> postboard_core::Result<Post> {
            self.inner.insert_post(post).await
        }

        async fn find_post_by_id(&self, id: Uuid) -> postboard_core::Result<Option<Post>> {
            self.inner.find_post_by_id(id).await
        }

        async fn find_post_with_creator(
            &self,
            id: Uuid,
        ) -> postboard_core::Result<Option<PostWithCreator>> {
            self.inner.find_post_with_creator(id).await
        }

        async fn save_post(&self, post: &Post) -> postboard_core::Result<()> {
            Self::check(&self.posts)?;
            self.inner.save_post(post).await
        }

        async fn delete_post(&self, id: Uuid) -> postboard_core::Result<bool> {
            Self::check(&self.posts)?;
            self.inner.delete_post(id).await
        }

        async fn count_posts(&self) -> postboard_core::Result<u64> {
            self.inner.count_posts().await
        }

        async fn list_posts(
            &self,
            skip: u64,
            limit: u64,
        ) -> postboard_core::Result<Vec<PostWithCreator>> {
            self.inner.list_posts(skip, limit).await
        }
    }

    struct FailingFixture {
        service: FeedService,
        store: Arc<FailingWrites>,
        notifier: FeedNotifier,
        dir: TempDir,
    }

    fn failing_fixture() -> FailingFixture {
        let store = Arc::new(FailingWrites::default());
        let dir = TempDir::new().unwrap();
        let notifier = FeedNotifier::default();
        let service = FeedService::new(
            store.clone(),
            Arc::new(LocalImageStore::new(dir.path())),
            notifier.clone(),
            2,
        );
        FailingFixture {
            service,
            store,
            notifier,
            dir,
        }
    }

    fn files_in(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir.join(crate::storage::IMAGE_SUBDIR))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_create_rolls_back_when_owner_update_fails() {
        let f = failing_fixture();
        let mut events = f.notifier.subscribe();
        let user = add_user(&*f.store, "test@test.com").await;
        f.store.users.store(true, Ordering::SeqCst);

        let err = f
            .service
            .create(user.id, input("First post"), image())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unexpected(_)));
        assert_eq!(f.store.count_posts().await.unwrap(), 0);
        assert_eq!(files_in(f.dir.path()), 0);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_update_keeps_current_image() {
        let f = failing_fixture();
        let user = add_user(&*f.store, "test@test.com").await;
        let post = f
            .service
            .create(user.id, input("First post"), image())
            .await
            .unwrap();
        f.store.posts.store(true, Ordering::SeqCst);

        let err = f
            .service
            .update(post.id, user.id, input("Edited title"), image(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unexpected(_)));

        let stored = f.store.find_post_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.image_url, post.image_url);
        assert!(f.dir.path().join(&stored.image_url).exists());
        // The rejected upload is not left behind
        assert_eq!(files_in(f.dir.path()), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_image() {
        let f = failing_fixture();
        let user = add_user(&*f.store, "test@test.com").await;
        let post = f
            .service
            .create(user.id, input("First post"), image())
            .await
            .unwrap();
        f.store.posts.store(true, Ordering::SeqCst);

        let err = f.service.delete(post.id, user.id).await.unwrap_err();
        assert!(matches!(err, AppError::Unexpected(_)));

        assert!(f.store.find_post_by_id(post.id).await.unwrap().is_some());
        assert!(f.dir.path().join(&post.image_url).exists());
    }

    #[tokio::test]
    async fn test_delete_reports_failed_owner_update() {
        let f = failing_fixture();
        let user = add_user(&*f.store, "test@test.com").await;
        let post = f
            .service
            .create(user.id, input("First post"), image())
            .await
            .unwrap();
        f.store.users.store(true, Ordering::SeqCst);

        let err = f.service.delete(post.id, user.id).await.unwrap_err();
        assert!(matches!(err, AppError::Unexpected(_)));
        assert!(f.store.find_post_by_id(post.id).await.unwrap().is_none());
        assert!(!f.dir.path().join(&post.image_url).exists());
    }
}
