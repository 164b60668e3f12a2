use clap::Parser;
use colored::*;
use std::process;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use sse_session::cli::{parse_call, Args};
use sse_session::config::{ClientConfig, FileConfig};
use sse_session::logging::init_tracing;
use sse_session::ui::{
    display_call_error, display_close, display_event, display_result, display_session,
};
use sse_session::SessionClientBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Handle --config-init option
    if args.config_init {
        let Some(path) = FileConfig::user_config_dir().map(|dir| dir.join("config.yaml")) else {
            eprintln!("{}", "Error: could not determine home directory".red());
            process::exit(1);
        };
        if FileConfig::write_example(&path)? {
            println!("{}", format!("Wrote example config to {}", path.display()).green());
        } else {
            println!(
                "{}",
                format!("Config already exists at {}", path.display()).yellow()
            );
        }
        return Ok(());
    }

    // Parse calls up front so a typo fails before connecting
    let mut calls = Vec::with_capacity(args.calls.len());
    for raw in &args.calls {
        match parse_call(raw) {
            Ok(call) => calls.push(call),
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red(), e);
                process::exit(1);
            }
        }
    }

    let config = match ClientConfig::from_env_and_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            process::exit(1);
        }
    };

    init_tracing(config.verbose);

    if config.verbose {
        eprintln!(
            "{}",
            format!(
                "[sse] Connecting to {} (mode: {}, connect timeout: {}s)",
                config.server_url, config.correlation, config.connect_timeout_secs
            )
            .dimmed()
        );
    }

    let mut builder = SessionClientBuilder::from_config(&config).on_close(display_close);
    if config.verbose {
        builder = builder.on_event(display_event);
    }

    let client = match builder.connect().await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };

    if let Some(session) = client.session() {
        display_session(client.base_url(), &session);
    }

    // Without --verbose, still show pushed notifications
    let printer = if config.verbose {
        None
    } else {
        let mut notifications = client.notifications();
        Some(tokio::spawn(async move {
            loop {
                match notifications.recv().await {
                    Ok(event) => display_event(&event),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    };

    let mut failures = 0;
    for (method, params) in calls {
        match client.call(&method, params).await {
            Ok(value) => display_result(&method, &value),
            Err(e) => {
                failures += 1;
                display_call_error(&method, &e);
            }
        }
    }

    if args.linger > 0 {
        println!(
            "{}",
            format!("Keeping the connection open for {} seconds...", args.linger).dimmed()
        );
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(args.linger)) => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    }

    client.close().await;
    if let Some(printer) = printer {
        printer.abort();
    }

    if failures > 0 {
        process::exit(1);
    }
    Ok(())
}
