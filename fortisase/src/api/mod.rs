//! FortiSASE REST API access
//!
//! Objects live in collections addressed by path, e.g.
//! `/resource-api/v1/security/dlp-profiles`, and are identified inside a
//! collection by their primary key (mkey). Bodies are camelCase JSON.

pub mod client;
pub mod common;
pub mod error;
#[cfg(test)]
pub mod test_helpers;

pub use client::{Client, ClientConfig, DEFAULT_HOSTNAME};
pub use common::{ApiErrorDetails, ApiErrorResponse, ApiQueryParams};
pub use error::ApiError;

use async_trait::async_trait;
use serde_json::Value;

/// The four calls every resource is built from
///
/// An empty `mkey` addresses the collection itself, which is how
/// singleton configuration objects are read and written.
#[async_trait]
pub trait SaseApi: Send + Sync {
    async fn read(&self, path: &str, mkey: &str, query: &ApiQueryParams) -> Result<Value, ApiError>;

    async fn create(
        &self,
        path: &str,
        body: &Value,
        query: &ApiQueryParams,
    ) -> Result<Value, ApiError>;

    async fn update(
        &self,
        path: &str,
        mkey: &str,
        body: &Value,
        query: &ApiQueryParams,
    ) -> Result<Value, ApiError>;

    async fn delete(&self, path: &str, mkey: &str, query: &ApiQueryParams) -> Result<(), ApiError>;
}
