use std::time::Duration;

use tokio::sync::watch;

use super::Session;
use crate::sse::Frame;

pub const ENDPOINT_EVENT: &str = "endpoint";

#[derive(Debug, Clone)]
enum Gate {
    Waiting,
    Ready(Session),
    Shut,
}

/// Outcome of waiting on the readiness gate. Timeouts are not errors here;
/// the caller decides what a missing session means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyOutcome {
    Ready(Session),
    TimedOut,
    Closed,
}

/// One-shot gate that opens on the first `endpoint` frame of a connection.
#[derive(Debug)]
pub struct SessionNegotiator {
    gate: watch::Sender<Gate>,
}

impl SessionNegotiator {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(Gate::Waiting);
        Self { gate }
    }

    /// Inspect a frame. Returns `true` only for the frame that opened the gate.
    pub fn intake(&self, frame: &Frame) -> bool {
        if frame.event_type.as_deref() != Some(ENDPOINT_EVENT) {
            return false;
        }

        self.gate.send_if_modified(|gate| {
            if !matches!(gate, Gate::Waiting) {
                tracing::debug!(data = %frame.data, "Ignoring endpoint event after negotiation");
                return false;
            }
            let session = Session::from_endpoint(&frame.data);
            tracing::info!(
                session_id = session.session_id.as_deref().unwrap_or("-"),
                submit_path = %session.submit_path,
                "Session negotiated"
            );
            *gate = Gate::Ready(session);
            true
        })
    }

    pub fn session(&self) -> Option<Session> {
        match &*self.gate.borrow() {
            Gate::Ready(session) => Some(session.clone()),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.gate.borrow(), Gate::Ready(_))
    }

    /// Suspend until the gate opens, the negotiator is shut, or `timeout` elapses.
    pub async fn wait_ready(&self, timeout: Duration) -> ReadyOutcome {
        let mut rx = self.gate.subscribe();
        let wait = async {
            loop {
                let settled = {
                    let gate = rx.borrow_and_update();
                    match &*gate {
                        Gate::Waiting => None,
                        Gate::Ready(session) => Some(ReadyOutcome::Ready(session.clone())),
                        Gate::Shut => Some(ReadyOutcome::Closed),
                    }
                };
                if let Some(outcome) = settled {
                    return outcome;
                }
                if rx.changed().await.is_err() {
                    return ReadyOutcome::Closed;
                }
            }
        };

        tokio::time::timeout(timeout, wait)
            .await
            .unwrap_or(ReadyOutcome::TimedOut)
    }

    /// Discard the session and release every waiter with `Closed`.
    pub fn shut(&self) {
        self.gate.send_replace(Gate::Shut);
    }

    /// Release waiters only if no session was negotiated yet.
    pub fn abandon(&self) {
        self.gate.send_if_modified(|gate| {
            if matches!(gate, Gate::Waiting) {
                *gate = Gate::Shut;
                true
            } else {
                false
            }
        });
    }
}

impl Default for SessionNegotiator {
    fn default() -> Self {
        Self::new()
    }
}
