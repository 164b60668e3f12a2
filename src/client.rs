//! The session client: event stream, negotiated session, and correlated calls.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, watch};

use crate::config::{defaults, ClientConfig};
use crate::error::{Result, SseClientError};
use crate::event::{CloseReason, StreamEvent};
use crate::reader::{Dispatcher, EventStreamReader, Handlers};
use crate::rpc::{CorrelationMode, RequestCorrelator};
use crate::session::{ReadyOutcome, Session, SessionNegotiator};
use crate::transport::{resolve_submit_url, HttpTransport, Transport};

const NOTIFICATION_CAPACITY: usize = 64;

pub struct SessionClientBuilder {
    base_url: String,
    transport: Option<Arc<dyn Transport>>,
    mode: CorrelationMode,
    connect_timeout: Duration,
    call_timeout: Duration,
    headers: HashMap<String, String>,
    handlers: Handlers,
}

impl SessionClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            transport: None,
            mode: CorrelationMode::default(),
            connect_timeout: Duration::from_secs(defaults::default_connect_timeout()),
            call_timeout: Duration::from_secs(defaults::default_call_timeout()),
            headers: HashMap::new(),
            handlers: Handlers::default(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.server_url.clone())
            .correlation(config.correlation)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .call_timeout(Duration::from_secs(config.call_timeout_secs))
            .headers(config.headers.clone())
    }

    /// Use a custom transport instead of the default `reqwest` one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn correlation(mut self, mode: CorrelationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn on_open(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.handlers.on_open.push(Arc::new(handler));
        self
    }

    /// Called from the reader task for every frame, in wire order.
    pub fn on_event(mut self, handler: impl Fn(&StreamEvent) + Send + Sync + 'static) -> Self {
        self.handlers.on_event.push(Arc::new(handler));
        self
    }

    /// Called once when the event stream stops, whatever the cause.
    pub fn on_close(mut self, handler: impl Fn(&CloseReason) + Send + Sync + 'static) -> Self {
        self.handlers.on_close.push(Arc::new(handler));
        self
    }

    /// Open the event stream and start reading, without waiting for the endpoint event.
    pub async fn start(self) -> Result<SessionClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.headers)?),
        };

        let stream = transport.open_stream(&self.base_url).await?;
        tracing::debug!(url = %self.base_url, mode = %self.mode, "Event stream open");

        let negotiator = Arc::new(SessionNegotiator::new());
        let correlator = Arc::new(RequestCorrelator::new(self.mode));
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        let reader = EventStreamReader::start(
            stream,
            Dispatcher {
                negotiator: negotiator.clone(),
                correlator: correlator.clone(),
                handlers: self.handlers,
                notifications: notifications.clone(),
            },
        );

        let (closed, _) = watch::channel(false);

        Ok(SessionClient {
            base_url: self.base_url,
            transport,
            negotiator,
            correlator,
            reader,
            notifications,
            closed,
            connect_timeout: self.connect_timeout,
            call_timeout: self.call_timeout,
        })
    }

    /// Open the event stream and wait for the server to announce the session.
    pub async fn connect(self) -> Result<SessionClient> {
        let client = self.start().await?;
        let timeout = client.connect_timeout;

        match client.wait_ready(timeout).await {
            ReadyOutcome::Ready(_) => Ok(client),
            ReadyOutcome::TimedOut => {
                tracing::warn!(timeout = ?timeout, "No endpoint event received");
                client.close().await;
                Err(SseClientError::ConnectTimeout(timeout))
            }
            ReadyOutcome::Closed => {
                let reason = client.reader.stop().await;
                client.close().await;
                Err(SseClientError::Transport(format!(
                    "event stream closed before endpoint event ({:?})",
                    reason.unwrap_or(CloseReason::EndOfStream)
                )))
            }
        }
    }
}

pub struct SessionClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    negotiator: Arc<SessionNegotiator>,
    correlator: Arc<RequestCorrelator>,
    reader: EventStreamReader,
    notifications: broadcast::Sender<StreamEvent>,
    closed: watch::Sender<bool>,
    connect_timeout: Duration,
    call_timeout: Duration,
}

impl SessionClient {
    pub fn builder(base_url: impl Into<String>) -> SessionClientBuilder {
        SessionClientBuilder::new(base_url)
    }

    /// Connect with default settings.
    pub async fn connect(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        SessionClientBuilder::new(base_url)
            .connect_timeout(timeout)
            .connect()
            .await
    }

    pub async fn wait_ready(&self, timeout: Duration) -> ReadyOutcome {
        if *self.closed.borrow() {
            return ReadyOutcome::Closed;
        }
        self.negotiator.wait_ready(timeout).await
    }

    pub fn session(&self) -> Option<Session> {
        self.negotiator.session()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn correlation(&self) -> CorrelationMode {
        self.correlator.mode()
    }

    /// Ready to take calls: session negotiated, stream still open, not closed.
    pub fn is_connected(&self) -> bool {
        !*self.closed.borrow() && self.reader.is_open() && self.negotiator.is_ready()
    }

    /// Frames that are neither the endpoint event nor a correlated response.
    pub fn notifications(&self) -> broadcast::Receiver<StreamEvent> {
        self.notifications.subscribe()
    }

    pub fn pending_requests(&self) -> usize {
        self.correlator.pending_count()
    }

    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.call_with_timeout(method, params, self.call_timeout)
            .await
    }

    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() || !self.reader.is_open() {
            return Err(SseClientError::NotConnected);
        }
        let session = self.negotiator.session().ok_or(SseClientError::NotConnected)?;
        let submit_url = resolve_submit_url(&self.base_url, &session.submit_path)?;

        tokio::select! {
            result = self.correlator.call(
                self.transport.as_ref(),
                &submit_url,
                method,
                params,
                timeout,
            ) => result,
            _ = closed.changed() => Err(SseClientError::Closed),
        }
    }

    /// Stop the reader and discard the session. In-flight waits fail with `Closed`.
    pub async fn close(&self) {
        if self.closed.send_replace(true) {
            return;
        }
        self.negotiator.shut();
        self.correlator.fail_all(|| SseClientError::Closed);
        self.reader.stop().await;
        tracing::info!(url = %self.base_url, "Session closed");
    }
}
