//! Raw API Port - Object-safe HTTP boundary
//!
//! `RawApiPort` is the object-safe boundary implemented by the HTTP adapter.
//! Every method returns the `data` field of the response envelope (JSON `null`
//! when the server sent none); envelope and status handling stay in the
//! adapter. The application layer provides a typed wrapper on top.

use serde_json::Value;

use super::ApiError;

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait::async_trait]
pub trait RawApiPort: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError>;

    async fn post_empty(&self, path: &str) -> Result<Value, ApiError>;

    async fn delete(&self, path: &str) -> Result<Value, ApiError>;
}
