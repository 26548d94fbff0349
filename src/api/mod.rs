//! HTTP handlers and router

pub mod admin;
pub mod books;
pub mod orders;
pub mod routes;
pub mod wishlist;

pub use routes::{build_state, create_router, AppState};

use crate::error::{ApiError, ApiResult};
use uuid::Uuid;

/// Parse a path id. A malformed id cannot name anything, so it is a 404.
pub(crate) fn parse_id(raw: &str, not_found: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(not_found.to_string()))
}

/// Run store work that hashes or verifies passwords on the blocking pool.
pub(crate) async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_malformed_id_is_not_found() {
        let err = parse_id("not-a-uuid", "Book not found").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "x").unwrap(), id);
    }

    #[tokio::test]
    async fn test_blocking_propagates_errors() {
        assert_eq!(blocking(|| Ok(7)).await.unwrap(), 7);

        let err = blocking::<(), _>(|| Err(anyhow::anyhow!("boom"))).await.unwrap_err();
        assert_eq!(err.message(), "boom");
    }
}
