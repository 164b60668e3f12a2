#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sse_session::transport::{ByteStream, PostReply, Transport};
use sse_session::{Result, SseClientError};

pub const BASE_URL: &str = "http://localhost:3003";

type Responder = Box<dyn Fn(&Value) -> PostReply + Send + Sync>;

/// In-memory transport: the test writes the event stream and scripts POST replies.
pub struct ScriptedTransport {
    stream: Mutex<Option<UnboundedReceiver<Result<Bytes>>>>,
    posts: Mutex<Vec<(String, Value)>>,
    responder: Responder,
}

/// The test's end of the event stream.
#[derive(Clone)]
pub struct StreamFeed(UnboundedSender<Result<Bytes>>);

impl StreamFeed {
    pub fn send(&self, text: &str) {
        let _ = self.0.unbounded_send(Ok(Bytes::from(text.to_string())));
    }

    pub fn endpoint(&self, path: &str) {
        self.send(&format!("event: endpoint\ndata: {}\n\n", path));
    }

    pub fn message(&self, value: &Value) {
        self.send(&format!("event: message\ndata: {}\n\n", value));
    }

    pub fn fail(&self, message: &str) {
        let _ = self
            .0
            .unbounded_send(Err(SseClientError::Transport(message.to_string())));
    }

    pub fn end(self) {
        self.0.close_channel();
    }
}

pub fn scripted(
    responder: impl Fn(&Value) -> PostReply + Send + Sync + 'static,
) -> (Arc<ScriptedTransport>, StreamFeed) {
    let (tx, rx) = unbounded();
    let transport = ScriptedTransport {
        stream: Mutex::new(Some(rx)),
        posts: Mutex::new(Vec::new()),
        responder: Box::new(responder),
    };
    (Arc::new(transport), StreamFeed(tx))
}

/// Replies the way a direct-mode server does: the result in the POST body.
pub fn echo_result(result: Value) -> impl Fn(&Value) -> PostReply + Send + Sync + 'static {
    move |request: &Value| {
        PostReply::new(
            200,
            json!({"jsonrpc": "2.0", "id": request["id"], "result": result}).to_string(),
        )
    }
}

/// Replies the way a stream-mode server does: an empty acknowledgement.
pub fn accepted() -> impl Fn(&Value) -> PostReply + Send + Sync + 'static {
    |_: &Value| PostReply::new(202, "Accepted")
}

impl ScriptedTransport {
    pub fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open_stream(&self, _url: &str) -> Result<ByteStream> {
        let rx = self
            .stream
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| SseClientError::Transport("stream already opened".to_string()))?;
        Ok(rx.boxed())
    }

    async fn post(&self, url: &str, body: String) -> Result<PostReply> {
        let request: Value = serde_json::from_str(&body)?;
        let reply = (self.responder)(&request);
        self.posts.lock().unwrap().push((url.to_string(), request));
        Ok(reply)
    }
}

/// Poll `condition` until it holds, failing the test after a generous deadline.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}
