//! Chirpy: a small backend for short text posts.

pub mod assets;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod hits;
pub mod models;
pub mod sanitize;
pub mod store;
pub mod validation;

use std::path::PathBuf;
use std::sync::Arc;

use assets::AssetDir;
use config::DEV_PLATFORM;
use hits::HitCounter;
use store::ChirpStore;

/// State shared by every worker, registered once as `web::Data<AppState>`.
pub struct AppState {
    pub store: Arc<dyn ChirpStore>,
    pub hits: HitCounter,
    pub assets: AssetDir,
    pub metrics_template: PathBuf,
    pub platform: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ChirpStore>,
        assets: AssetDir,
        metrics_template: PathBuf,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            store,
            hits: HitCounter::new(),
            assets,
            metrics_template,
            platform: platform.into(),
        }
    }

    pub fn is_dev(&self) -> bool {
        self.platform == DEV_PLATFORM
    }
}
