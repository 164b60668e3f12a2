//! Client for servers that negotiate a session over Server-Sent Events and
//! answer JSON-RPC requests posted to the announced endpoint.
//!
//! ```no_run
//! use std::time::Duration;
//! use sse_session::SessionClient;
//!
//! # async fn example() -> sse_session::Result<()> {
//! let client = SessionClient::connect("http://localhost:3003", Duration::from_secs(10)).await?;
//! let methods = client.call("get-methods", serde_json::json!({})).await?;
//! println!("{}", methods);
//! client.close().await;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod reader;
pub mod rpc;
pub mod session;
pub mod sse;
pub mod transport;
pub mod ui;

pub use client::{SessionClient, SessionClientBuilder};
pub use error::{Result, SseClientError};
pub use event::{CloseReason, EventPayload, StreamEvent};
pub use rpc::CorrelationMode;
pub use session::{ReadyOutcome, Session};
pub use transport::{HttpTransport, PostReply, Transport};
