mod negotiator;

pub use negotiator::{ReadyOutcome, SessionNegotiator, ENDPOINT_EVENT};

/// The session a server assigned through its endpoint event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: Option<String>,
    /// Where requests are posted, exactly as the server announced it.
    pub submit_path: String,
}

impl Session {
    pub fn from_endpoint(data: &str) -> Self {
        Self {
            session_id: query_param(data, "sessionId"),
            submit_path: data.to_string(),
        }
    }
}

/// Look up a query parameter in a URL or bare path.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}
