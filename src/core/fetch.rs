use crate::core::error::FetchError;
use async_trait::async_trait;

/// Resolves a URL to UTF-8 page text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}
