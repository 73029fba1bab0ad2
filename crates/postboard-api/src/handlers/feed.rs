//! Feed API handlers
//!
//! Post creation and update take `multipart/form-data` with `title`,
//! `content` and `image` parts. On update `image` may instead be a plain text
//! part carrying the path of the image the post already has.
//!
//! Author: hephaex@gmail.com

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::feed::PostInput;
use crate::realtime;
use crate::state::AppState;
use crate::storage::{is_allowed_image, ImageUpload};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Extension, Json,
};
use futures::stream::Stream;
use postboard_core::PostWithCreator;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Feed query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct FeedQuery {
    /// Page number, starting at 1
    #[param(example = 1)]
    pub page: Option<i64>,
}

/// One page of posts
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostListResponse {
    pub message: String,
    #[schema(value_type = Vec<Object>)]
    pub posts: Vec<PostWithCreator>,
    /// Number of posts across all pages
    pub total_items: u64,
}

/// A single post
#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    pub message: String,
    #[schema(value_type = Object)]
    pub post: PostWithCreator,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Multipart layout of the create and update forms
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct PostFormSchema {
    #[schema(example = "First post")]
    title: String,
    #[schema(example = "Hello from the feed")]
    content: String,
    /// PNG or JPEG file; on update the current image path is accepted instead
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}

/// Fields collected from a post form
#[derive(Debug, Default)]
struct PostForm {
    input: PostInput,
    upload: Option<ImageUpload>,
    existing_image: Option<String>,
}

async fn read_post_form(mut multipart: Multipart) -> Result<PostForm, AppError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let is_file = field.file_name().is_some();

        match (name.as_str(), is_file) {
            ("image", true) => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Invalid form data: {e}")))?;

                if is_allowed_image(&content_type) && !bytes.is_empty() {
                    form.upload = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes,
                    });
                } else {
                    tracing::debug!(content_type = %content_type, "Ignoring unsupported upload");
                }
            }
            ("image", false) => form.existing_image = Some(text(field).await?),
            ("title", _) => form.input.title = text(field).await?,
            ("content", _) => form.input.content = text(field).await?,
            _ => {}
        }
    }

    Ok(form)
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::validation(format!("Invalid form data: {e}")))
}

/// Unparseable ids cannot name an existing post
fn parse_post_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::NotFound("Could not find the requested post.".to_string()))
}

#[utoipa::path(
    get,
    path = "/feed/posts",
    tag = "feed",
    params(FeedQuery),
    responses(
        (status = 200, description = "Posts fetched", body = PostListResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<PostListResponse>, AppError> {
    let page = state.feed.list(query.page).await?;

    Ok(Json(PostListResponse {
        message: "Fetched posts successfully.".to_string(),
        posts: page.posts,
        total_items: page.total_items,
    }))
}

#[utoipa::path(
    post,
    path = "/feed/post",
    tag = "feed",
    request_body(content = PostFormSchema, content_type = "multipart/form-data", description = "Title, content and image"),
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 422, description = "Invalid input or missing image", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_post_form(multipart).await?;
    let post = state
        .feed
        .create(user.user_id, form.input, form.upload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            message: "Post created successfully!".to_string(),
            post,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/feed/post/{postId}",
    tag = "feed",
    params(("postId" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post fetched", body = PostResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let post = state.feed.get(parse_post_id(&post_id)?).await?;

    Ok(Json(PostResponse {
        message: "Post fetched.".to_string(),
        post,
    }))
}

#[utoipa::path(
    put,
    path = "/feed/post/{postId}",
    tag = "feed",
    params(("postId" = String, Path, description = "Post id")),
    request_body(content = PostFormSchema, content_type = "multipart/form-data", description = "Title, content and a new image or the current image path"),
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 403, description = "Not the owner", body = crate::error::ApiError),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
        (status = 422, description = "Invalid input or no image", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<PostResponse>, AppError> {
    let post_id = parse_post_id(&post_id)?;
    let form = read_post_form(multipart).await?;
    let post = state
        .feed
        .update(
            post_id,
            user.user_id,
            form.input,
            form.upload,
            form.existing_image,
        )
        .await?;

    Ok(Json(PostResponse {
        message: "Post updated!".to_string(),
        post,
    }))
}

#[utoipa::path(
    delete,
    path = "/feed/post/{postId}",
    tag = "feed",
    params(("postId" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 403, description = "Not the owner", body = crate::error::ApiError),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(post_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .feed
        .delete(parse_post_id(&post_id)?, user.user_id)
        .await?;

    Ok(Json(MessageResponse {
        message: "Deleted post.".to_string(),
    }))
}

/// Follow feed changes as server-sent `posts` events
#[utoipa::path(
    get,
    path = "/feed/events",
    tag = "feed",
    responses(
        (status = 200, description = "Stream of created, updated and deleted posts", content_type = "text/event-stream", body = String),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn feed_events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(user_id = %user.user_id, "Feed subscriber connected");

    Sse::new(realtime::sse_stream(state.notifier.subscribe())).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
