use crate::auth::codes::CodeSender;
use crate::auth::rate_limit::AuthRateLimits;
use crate::config::AppConfig;
use crate::storage::Storage;
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: Arc<AppConfig>,
    pub code_sender: Arc<dyn CodeSender>,
    pub rate_limits: Arc<AuthRateLimits>,
}
