use colored::*;
use futures::StreamExt;
use std::collections::HashMap;
use std::env;

use sse_session::cli::parse_header;
use sse_session::event::EventPayload;
use sse_session::session::{Session, ENDPOINT_EVENT};
use sse_session::sse::{FrameParser, LineDecoder};
use sse_session::transport::{HttpTransport, Transport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Get command line args
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <stream-url> [NAME=VALUE header ...]", args[0]);
        std::process::exit(1);
    }

    let url = &args[1];
    let mut headers = HashMap::new();
    for raw in &args[2..] {
        let (name, value) = parse_header(raw)?;
        headers.insert(name, value);
    }

    println!("{}", format!("Stream: {}", url).cyan());
    println!("{}", "-".repeat(80).dimmed());

    let transport = HttpTransport::new(&headers)?;
    let mut stream = match transport.open_stream(url).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
            std::process::exit(1);
        }
    };

    let mut lines = LineDecoder::new();
    let mut parser = FrameParser::new();
    let mut frames = 0usize;

    loop {
        let chunk = tokio::select! {
            chunk = stream.next() => chunk,
            _ = tokio::signal::ctrl_c() => break,
        };
        let chunk = match chunk {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => {
                eprintln!("{}", format!("Stream error: {}", e).red());
                break;
            }
            None => break,
        };

        for line in lines.push(&chunk) {
            if line.is_empty() {
                println!();
            } else {
                println!("{}", line.dimmed());
            }

            let Some(frame) = parser.push_line(&line) else {
                continue;
            };
            frames += 1;

            let kind = frame.event_type.as_deref().unwrap_or("message");
            println!("{}", format!("Frame #{} ({})", frames, kind).green());

            if kind == ENDPOINT_EVENT {
                let session = Session::from_endpoint(&frame.data);
                println!(
                    "{}: {}",
                    "Session".yellow(),
                    session.session_id.as_deref().unwrap_or("(none)")
                );
                println!("{}: {}", "Submit path".yellow(), session.submit_path);
            } else {
                match EventPayload::from_data(&frame.data) {
                    EventPayload::Json(value) => {
                        println!("{}", serde_json::to_string_pretty(&value)?)
                    }
                    EventPayload::Text(text) => println!("{}: {}", "Text".yellow(), text),
                }
            }
            println!();
        }
    }

    if parser.has_partial() || !lines.pending().is_empty() {
        println!("{}", "(unterminated frame discarded)".yellow());
    }
    println!("{}", "-".repeat(80).dimmed());
    println!("{}", format!("Stream ended after {} frames", frames).green());

    Ok(())
}
