pub mod client;
pub mod credential;
pub mod http;
pub mod image;

use async_trait::async_trait;
use ecourts_core::Result;
use serde_json::Value;

/// JSON request/response seam between the workflow and the backend.
///
/// Paths are relative to the API base (e.g. `/districts`). Implementations
/// map non-2xx statuses, transport failures and undecodable bodies onto
/// `ecourts_core::Error`; a returned `Value` is always a 2xx JSON body.
#[async_trait]
pub trait Api: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value>;
    async fn post(&self, path: &str, body: &Value) -> Result<Value>;
}

pub use client::build_http_client;
pub use http::HttpApi;
pub use image::resolve_image_url;
