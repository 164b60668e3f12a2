use crate::error::SseClientError;
use crate::event::{CloseReason, EventPayload, StreamEvent};
use crate::rpc::JsonRpcResponse;
use crate::session::Session;
use colored::*;
use serde_json::Value;

/// Pretty JSON, or the compact form if pretty printing fails
pub fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// One line describing a pushed event, without colour.
pub fn format_event(event: &StreamEvent) -> String {
    let kind = event.event_type.as_deref().unwrap_or("message");
    match &event.payload {
        EventPayload::Json(value) => format!("[{}] {}", kind, value),
        EventPayload::Text(text) => format!("[{}] {}", kind, text),
    }
}

pub fn display_session(url: &str, session: &Session) {
    let id = session.session_id.as_deref().unwrap_or("(none)");
    println!(
        "{}",
        format!("Connected to {} (session {})", url, id).green()
    );
    println!("{}", format!("  endpoint: {}", session.submit_path).dimmed());
}

/// Show a call result. JSON-RPC error members are shown as errors.
pub fn display_result(method: &str, value: &Value) {
    println!("{}", format!("--- {} ---", method).cyan());

    match serde_json::from_value::<JsonRpcResponse>(value.clone()) {
        Ok(response) if response.error.is_some() || response.result.is_some() => {
            match response.into_result() {
                Ok(result) => println!("{}", render_json(&result)),
                Err(error) => eprintln!("{}", error.to_string().red()),
            }
        }
        _ => println!("{}", render_json(value)),
    }
}

pub fn display_call_error(method: &str, error: &SseClientError) {
    eprintln!("{}", format!("--- {} ---", method).cyan());
    let hint = if error.is_retryable() { " (retryable)" } else { "" };
    eprintln!("{} {}{}", "Error:".red(), error, hint.dimmed());
    if let Some(raw) = error.raw_payload() {
        eprintln!("{}", format!("  raw: {}", raw).dimmed());
    }
}

pub fn display_event(event: &StreamEvent) {
    let stamp = chrono::Local::now().format("%H:%M:%S%.3f");
    eprintln!("{}", format!("{} {}", stamp, format_event(event)).dimmed());
}

pub fn display_close(reason: &CloseReason) {
    match reason {
        CloseReason::Error(message) => {
            eprintln!("{}", format!("Event stream failed: {}", message).red())
        }
        CloseReason::EndOfStream => eprintln!("{}", "Event stream ended by server".yellow()),
        CloseReason::Shutdown => eprintln!("{}", "Event stream closed".dimmed()),
    }
}
