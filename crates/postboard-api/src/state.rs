//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::auth::{AuthService, PasswordConfig, TokenService};
use crate::feed::FeedService;
use crate::realtime::FeedNotifier;
use crate::storage::ImageStore;
use postboard_core::{AppConfig, Store};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Token issuance and verification
    pub tokens: TokenService,
    /// Signup and login
    pub auth: AuthService,
    /// Post lifecycle and user status
    pub feed: FeedService,
    /// Feed change notifications
    pub notifier: FeedNotifier,
}

impl AppState {
    /// Wire services from configuration and the chosen backends
    pub fn new(config: AppConfig, store: Arc<dyn Store>, images: Arc<dyn ImageStore>) -> Self {
        let password = PasswordConfig::from(&config.auth);
        Self::with_password_config(config, store, images, password)
    }

    /// Same as [`AppState::new`] with explicit hashing costs
    pub fn with_password_config(
        config: AppConfig,
        store: Arc<dyn Store>,
        images: Arc<dyn ImageStore>,
        password: PasswordConfig,
    ) -> Self {
        let tokens = TokenService::new((&config.auth).into());
        let notifier = FeedNotifier::default();
        let auth = AuthService::new(store.clone(), tokens.clone(), password);
        let feed = FeedService::new(store, images, notifier.clone(), config.feed.page_size);

        Self {
            config,
            start_time: Instant::now(),
            tokens,
            auth,
            feed,
            notifier,
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
