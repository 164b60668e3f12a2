//! The HTTP boundary the client consumes: one streaming GET, one POST.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::error::{Result, SseClientError};

/// Raw event-stream body, chunked however the transport delivers it.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the long-lived event stream at `url`.
    async fn open_stream(&self, url: &str) -> Result<ByteStream>;

    /// POST a JSON body to `url` and return the reply.
    async fn post(&self, url: &str, body: String) -> Result<PostReply>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReply {
    pub status: u16,
    pub body: String,
}

impl PostReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn ensure_success(&self) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(SseClientError::HttpStatus {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    /// Decode the body as JSON, keeping the raw text when it is not.
    pub fn into_json(self) -> Result<Value> {
        self.ensure_success()?;
        serde_json::from_str(&self.body).map_err(|e| SseClientError::Protocol {
            message: format!("response body is not JSON: {}", e),
            raw: self.body,
        })
    }
}

/// Resolve the announced submit path against the stream URL.
pub fn resolve_submit_url(base_url: &str, submit_path: &str) -> Result<String> {
    let base = reqwest::Url::parse(base_url).map_err(|e| SseClientError::Protocol {
        message: format!("invalid server URL: {}", e),
        raw: base_url.to_string(),
    })?;
    let url = base.join(submit_path).map_err(|e| SseClientError::Protocol {
        message: format!("invalid endpoint path: {}", e),
        raw: submit_path.to_string(),
    })?;
    Ok(url.to_string())
}
