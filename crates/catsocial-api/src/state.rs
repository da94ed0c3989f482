use std::sync::Arc;

use catsocial_db::Database;
use tracing::error;

use crate::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    /// Argon2 iteration count used when hashing new passwords.
    pub hash_cost: u32,
}

/// Run synchronous work (SQLite, password hashing) off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("Blocking task failed: {}", e);
            ApiError::Internal
        })?
}
