//! Postboard API - REST server
//!
//! Provides HTTP endpoints for signup, login and an image-attached post
//! feed with per-post ownership.
//!
//! Author: hephaex@gmail.com

pub mod audit;
pub mod auth;
pub mod error;
pub mod feed;
pub mod handlers;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod state;
pub mod storage;

use crate::state::AppState;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::{HeaderValue, Method, Request},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info_span, Span};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI document served at `/api-docs/openapi.json`
#[derive(OpenApi)]
#[openapi(
    info(title = "Postboard API", description = "Users, posts and a paginated feed"),
    paths(
        handlers::health::health_check,
        handlers::health::prometheus_metrics,
        handlers::auth::signup_handler,
        handlers::auth::login_handler,
        handlers::auth::get_status_handler,
        handlers::auth::set_status_handler,
        handlers::feed::list_posts,
        handlers::feed::create_post,
        handlers::feed::get_post,
        handlers::feed::update_post,
        handlers::feed::delete_post,
        handlers::feed::feed_events,
    ),
    components(schemas(
        error::ApiError,
        error::FieldViolation,
        auth::SignupRequest,
        auth::SignupResponse,
        auth::LoginRequest,
        auth::LoginResponse,
        feed::StatusRequest,
        handlers::auth::StatusResponse,
        handlers::auth::StatusUpdatedResponse,
        handlers::feed::PostFormSchema,
        handlers::feed::PostListResponse,
        handlers::feed::PostResponse,
        handlers::feed::MessageResponse,
        handlers::health::HealthResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Signup, login and status"),
        (name = "feed", description = "Posts"),
        (name = "health", description = "Liveness and metrics"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the complete application router
///
/// Uploaded images are served from `<image_dir>/images` under `/images`.
pub fn create_router(state: Arc<AppState>) -> Router {
    middleware::register_metrics();

    let image_dir = state.config.storage.image_dir.join(storage::IMAGE_SUBDIR);
    let cors = cors_layer(&state.config.server.cors_origins);
    let max_body_size = state.config.server.max_body_size;

    Router::new()
        .merge(routes::api_routes(state.clone()))
        .merge(routes::ops_routes())
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest_service("/images", ServeDir::new(image_dir))
        .layer(axum::middleware::from_fn(middleware::metrics_middleware))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
    )
}
