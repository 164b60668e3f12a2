use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::rpc::CorrelationMode;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub correlation: Option<CorrelationMode>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TimeoutConfig {
    /// Seconds to wait for the endpoint event
    #[serde(default)]
    pub connect: Option<u64>,
    /// Seconds to wait for each response
    #[serde(default)]
    pub call: Option<u64>,
}
