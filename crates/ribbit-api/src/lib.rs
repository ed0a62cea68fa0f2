pub mod auth;
pub mod error;
pub mod middleware;
pub mod posts;
pub mod rbac;
pub mod request;
pub mod routes;
pub mod service;
pub mod users;

use tracing::error;

use crate::error::AppError;

/// Run blocking repository work off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        AppError::Internal
    })?
}
