//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::auth::middleware::auth_middleware;
use crate::handlers::{auth, feed, health};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// Create auth and feed routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/signup", put(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route(
            "/auth/status",
            get(auth::get_status_handler).patch(auth::set_status_handler),
        )
        .route("/feed/posts", get(feed::list_posts))
        .route("/feed/events", get(feed::feed_events))
        .route("/feed/post", post(feed::create_post))
        .route(
            "/feed/post/:postId",
            get(feed::get_post)
                .put(feed::update_post)
                .delete(feed::delete_post),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health and metrics routes
pub fn ops_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::prometheus_metrics))
}
