use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::StreamExt;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::error::SseClientError;
use crate::event::{CloseReason, EventPayload, StreamEvent};
use crate::rpc::{CorrelationMode, RequestCorrelator};
use crate::session::SessionNegotiator;
use crate::sse::{Frame, FrameParser, LineDecoder};
use crate::transport::ByteStream;

pub type OpenHandler = Arc<dyn Fn() + Send + Sync>;
pub type EventHandler = Arc<dyn Fn(&StreamEvent) + Send + Sync>;
pub type CloseHandler = Arc<dyn Fn(&CloseReason) + Send + Sync>;

/// Callbacks invoked from the reader task.
#[derive(Clone, Default)]
pub struct Handlers {
    pub on_open: Vec<OpenHandler>,
    pub on_event: Vec<EventHandler>,
    pub on_close: Vec<CloseHandler>,
}

/// Routes every completed frame: negotiator first, then the correlator and
/// event handlers, and finally the notification channel for anything unclaimed.
pub struct Dispatcher {
    pub negotiator: Arc<SessionNegotiator>,
    pub correlator: Arc<RequestCorrelator>,
    pub handlers: Handlers,
    pub notifications: broadcast::Sender<StreamEvent>,
}

impl Dispatcher {
    pub fn dispatch(&self, frame: &Frame) {
        tracing::debug!(event = frame.event_type.as_deref().unwrap_or("message"), data = %frame.data, "SSE frame");

        let negotiated = self.negotiator.intake(frame);
        let event = StreamEvent::from(frame);

        let mut claimed = negotiated;
        if !negotiated {
            if let (Some(id), EventPayload::Json(value)) = (event.payload.rpc_id(), &event.payload) {
                if self.correlator.resolve(&id, value.clone()) {
                    claimed = true;
                } else if is_response(value) {
                    // Direct-mode servers may echo replies on the stream; nothing waits on them
                    if self.correlator.mode() == CorrelationMode::Direct {
                        tracing::debug!(id = %id, "Discarding response echoed on the stream");
                    } else {
                        tracing::warn!(id = %id, "Discarding response with no pending request");
                    }
                    claimed = true;
                }
            }
        }

        for handler in &self.handlers.on_event {
            handler(&event);
        }

        if !claimed {
            // No subscribers is fine
            let _ = self.notifications.send(event);
        }
    }

    fn terminate(&self, reason: &CloseReason) {
        self.negotiator.abandon();
        match reason {
            CloseReason::Shutdown => self.correlator.fail_all(|| SseClientError::Closed),
            CloseReason::EndOfStream => self
                .correlator
                .fail_all(|| SseClientError::Transport("event stream ended".to_string())),
            CloseReason::Error(message) => self
                .correlator
                .fail_all(|| SseClientError::Transport(message.clone())),
        }
        for handler in &self.handlers.on_close {
            handler(reason);
        }
    }
}

fn is_response(value: &serde_json::Value) -> bool {
    value.get("result").is_some() || value.get("error").is_some()
}

/// Owns the event-stream connection and drains it on a background task.
pub struct EventStreamReader {
    open: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<CloseReason>>>,
}

impl EventStreamReader {
    /// Spawn the read loop. `on_open` handlers run before the first read.
    pub fn start(stream: ByteStream, dispatcher: Dispatcher) -> Self {
        let open = Arc::new(AtomicBool::new(true));
        let (shutdown, shutdown_rx) = watch::channel(false);

        for handler in &dispatcher.handlers.on_open {
            handler();
        }

        let task = {
            let open = open.clone();
            tokio::spawn(async move {
                let reason = read_loop(stream, &dispatcher, shutdown_rx).await;
                open.store(false, Ordering::SeqCst);
                match &reason {
                    CloseReason::Error(message) => {
                        tracing::warn!(error = %message, "Event stream failed")
                    }
                    other => tracing::info!(reason = ?other, "Event stream closed"),
                }
                dispatcher.terminate(&reason);
                reason
            })
        };

        Self {
            open,
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Stop the read loop and wait for it. Returns `None` if already stopped.
    pub async fn stop(&self) -> Option<CloseReason> {
        let _ = self.shutdown.send(true);
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        match task.await {
            Ok(reason) => Some(reason),
            Err(e) => Some(CloseReason::Error(format!("reader task failed: {}", e))),
        }
    }
}

impl Drop for EventStreamReader {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn read_loop(
    mut stream: ByteStream,
    dispatcher: &Dispatcher,
    mut shutdown: watch::Receiver<bool>,
) -> CloseReason {
    let mut lines = LineDecoder::new();
    let mut parser = FrameParser::new();

    loop {
        let chunk = tokio::select! {
            biased;
            _ = shutdown.changed() => return CloseReason::Shutdown,
            chunk = stream.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                for line in lines.push(&bytes) {
                    if let Some(frame) = parser.push_line(&line) {
                        dispatcher.dispatch(&frame);
                    }
                }
            }
            Some(Err(e)) => return CloseReason::Error(e.to_string()),
            None => {
                if parser.has_partial() || !lines.pending().is_empty() {
                    tracing::debug!("Dropping unterminated frame at end of stream");
                }
                return CloseReason::EndOfStream;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn dispatcher(mode: CorrelationMode) -> (Dispatcher, broadcast::Receiver<StreamEvent>) {
        let (notifications, rx) = broadcast::channel(8);
        let dispatcher = Dispatcher {
            negotiator: Arc::new(SessionNegotiator::new()),
            correlator: Arc::new(RequestCorrelator::new(mode)),
            handlers: Handlers::default(),
            notifications,
        };
        (dispatcher, rx)
    }

    fn dispatch_logged(dispatcher: &Dispatcher, frame: &Frame) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || dispatcher.dispatch(frame));

        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn response_frame() -> Frame {
        Frame {
            event_type: Some("message".to_string()),
            data: r#"{"jsonrpc":"2.0","id":"1","result":["list-tables"]}"#.to_string(),
        }
    }

    #[test]
    fn echoed_response_in_direct_mode_is_quiet() {
        let (dispatcher, mut rx) = dispatcher(CorrelationMode::Direct);
        let logs = dispatch_logged(&dispatcher, &response_frame());

        assert!(!logs.lines().any(|line| line.contains("WARN")), "{}", logs);
        assert!(logs
            .lines()
            .any(|line| line.contains("DEBUG") && line.contains("echoed")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unmatched_response_in_stream_mode_warns() {
        let (dispatcher, mut rx) = dispatcher(CorrelationMode::Stream);
        let logs = dispatch_logged(&dispatcher, &response_frame());

        assert!(logs
            .lines()
            .any(|line| line.contains("WARN") && line.contains("no pending request")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unclaimed_notification_is_broadcast() {
        let (dispatcher, mut rx) = dispatcher(CorrelationMode::Stream);
        dispatcher.dispatch(&Frame {
            event_type: None,
            data: r#"{"method":"tables-changed"}"#.to_string(),
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event.payload,
            EventPayload::Json(serde_json::json!({"method": "tables-changed"}))
        );
    }
}
