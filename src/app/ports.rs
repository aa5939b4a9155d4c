use async_trait::async_trait;
use std::sync::Arc;

/// Outbound HTTP seam used by the annotation client.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpGetResult, String>;
}

#[async_trait]
impl<T: HttpClientPort + ?Sized> HttpClientPort for Arc<T> {
    async fn get(&self, url: &str) -> Result<HttpGetResult, String> {
        (**self).get(url).await
    }
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
