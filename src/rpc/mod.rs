mod correlator;
mod types;

pub use correlator::{PendingCall, RequestCorrelator};
pub use types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a server puts the response to a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMode {
    /// The POST reply body is the response.
    #[default]
    Direct,
    /// The POST is only acknowledged; the response arrives as a stream frame with the same `id`.
    Stream,
}

impl FromStr for CorrelationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(CorrelationMode::Direct),
            "stream" | "sse" => Ok(CorrelationMode::Stream),
            other => Err(format!(
                "unknown correlation mode '{}' (expected direct or stream)",
                other
            )),
        }
    }
}

impl fmt::Display for CorrelationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationMode::Direct => write!(f, "direct"),
            CorrelationMode::Stream => write!(f, "stream"),
        }
    }
}
