use std::sync::Arc;

use common::storage::ContentStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::utils::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub content_store: Arc<dyn ContentStore>,
    pub rate_limiter: Arc<RateLimiter>,
}
