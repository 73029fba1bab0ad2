//! HTTP middleware shared by all routes
//!
//! Identity resolution lives in [`crate::auth::middleware`].
//!
//! Author: hephaex@gmail.com

pub mod metrics;
pub mod security_headers;

pub use metrics::{metrics_middleware, normalize_endpoint, register_metrics, render_metrics};
pub use security_headers::security_headers_middleware;
