use std::time::Duration;

/// Errors surfaced by the session client.
#[derive(Debug, thiserror::Error)]
pub enum SseClientError {
    /// The endpoint frame never arrived within the connect timeout.
    #[error("Connect timeout: no endpoint event within {0:?}")]
    ConnectTimeout(Duration),

    /// The underlying stream or socket failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("HTTP error (status {status}): {body}")]
    HttpStatus { status: u16, body: String },

    /// The server sent something that could not be interpreted.
    #[error("Protocol error: {message}")]
    Protocol { message: String, raw: String },

    #[error("Not connected: no negotiated session")]
    NotConnected,

    #[error("Request {id} timed out after {timeout:?}")]
    RequestTimeout { id: String, timeout: Duration },

    #[error("Session closed")]
    Closed,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SseClientError {
    /// Whether retrying the same operation could plausibly succeed.
    ///
    /// Timeouts and transport failures are treated as transient; protocol
    /// violations and lifecycle errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SseClientError::ConnectTimeout(_)
                | SseClientError::RequestTimeout { .. }
                | SseClientError::Transport(_)
        )
    }

    /// The raw payload behind a protocol error, if any.
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            SseClientError::Protocol { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SseClientError {
    fn from(err: reqwest::Error) -> Self {
        SseClientError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SseClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_retryable_protocol_errors_are_not() {
        let timeout = SseClientError::RequestTimeout {
            id: "3".to_string(),
            timeout: Duration::from_secs(1),
        };
        let protocol = SseClientError::Protocol {
            message: "not JSON".to_string(),
            raw: "<html>".to_string(),
        };

        assert!(timeout.is_retryable());
        assert!(!protocol.is_retryable());
        assert_eq!(protocol.raw_payload(), Some("<html>"));
        assert!(!SseClientError::Closed.is_retryable());
    }
}
