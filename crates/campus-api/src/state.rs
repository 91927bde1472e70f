use std::sync::Arc;

use campus_db::Database;
use tracing::error;

use crate::error::ApiError;
use crate::password::Passwords;
use crate::session::{CookieSettings, SessionKeys};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionKeys,
    pub passwords: Passwords,
    pub cookies: CookieSettings,
}

/// Runs store and hashing work off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })?
}
