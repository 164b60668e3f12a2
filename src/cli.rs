use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::rpc::CorrelationMode;

#[derive(Parser, Debug, Default)]
#[command(name = "sse-session")]
#[command(
    about = "Call JSON-RPC methods on a server that hands out sessions over SSE",
    long_about = None
)]
pub struct Args {
    #[arg(short = 'u', long = "url", help = "Event stream URL (e.g., http://localhost:3003)")]
    pub url: Option<String>,

    #[arg(
        short = 'm',
        long = "mode",
        help = "Where responses arrive: direct (POST reply) or stream (SSE frame)"
    )]
    pub mode: Option<CorrelationMode>,

    #[arg(long = "connect-timeout", help = "Seconds to wait for the endpoint event")]
    pub connect_timeout: Option<u64>,

    #[arg(long = "call-timeout", help = "Seconds to wait for each response")]
    pub call_timeout: Option<u64>,

    #[arg(
        short = 'H',
        long = "header",
        help = "Extra request header as NAME=VALUE (repeatable)"
    )]
    pub headers: Vec<String>,

    #[arg(
        short = 'l',
        long = "linger",
        default_value_t = 0,
        help = "Keep the stream open this many seconds after the last call, printing events"
    )]
    pub linger: u64,

    #[arg(short = 'v', long = "verbose", help = "Log stream frames and requests")]
    pub verbose: bool,

    #[arg(short = 'c', long = "config", help = "Read configuration from this file")]
    pub config: Option<PathBuf>,

    #[arg(long = "config-init", help = "Write an example config file and exit")]
    pub config_init: bool,

    #[arg(help = "Calls to make, as METHOD or METHOD=JSON_PARAMS")]
    pub calls: Vec<String>,
}

/// Split `METHOD[=JSON]` into a method name and its params (default `{}`).
pub fn parse_call(arg: &str) -> Result<(String, Value)> {
    let (method, params) = match arg.split_once('=') {
        Some((method, raw)) => {
            let params: Value = serde_json::from_str(raw)
                .with_context(|| format!("Invalid JSON params for '{}': {}", method, raw))?;
            (method, params)
        }
        None => (arg, json!({})),
    };

    let method = method.trim();
    if method.is_empty() {
        return Err(anyhow!("Empty method name in '{}'", arg));
    }
    Ok((method.to_string(), params))
}

/// Split `NAME=VALUE` or `NAME: VALUE` into a header pair.
pub fn parse_header(arg: &str) -> Result<(String, String)> {
    // Whichever separator comes first; values may contain either
    let pos = arg
        .find(|c| c == '=' || c == ':')
        .ok_or_else(|| anyhow!("Header must be NAME=VALUE: {}", arg))?;
    let (name, value) = (&arg[..pos], &arg[pos + 1..]);
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("Empty header name in '{}'", arg));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_method() {
        let (method, params) = parse_call("get-methods").unwrap();
        assert_eq!(method, "get-methods");
        assert_eq!(params, json!({}));
    }

    #[test]
    fn parses_method_with_params() {
        let (method, params) =
            parse_call(r#"execute-query={"query":"SELECT a=1 FROM t"}"#).unwrap();
        assert_eq!(method, "execute-query");
        assert_eq!(params["query"], "SELECT a=1 FROM t");
    }

    #[test]
    fn rejects_bad_params() {
        assert!(parse_call("describe-table={table").is_err());
        assert!(parse_call("={}").is_err());
    }

    #[test]
    fn parses_headers() {
        assert_eq!(
            parse_header("Authorization: Bearer x").unwrap(),
            ("Authorization".to_string(), "Bearer x".to_string())
        );
        assert_eq!(
            parse_header("X-Trace=1").unwrap(),
            ("X-Trace".to_string(), "1".to_string())
        );
        assert_eq!(
            parse_header("Authorization: Basic dXNlcg==").unwrap().1,
            "Basic dXNlcg=="
        );
        assert!(parse_header("nothing").is_err());
    }

    #[test]
    fn args_parse_mode_and_calls() {
        let args = Args::parse_from([
            "sse-session",
            "--mode",
            "stream",
            "-H",
            "X-A=1",
            "list-tables",
            "get-methods",
        ]);
        assert_eq!(args.mode, Some(CorrelationMode::Stream));
        assert_eq!(args.headers, vec!["X-A=1"]);
        assert_eq!(args.calls, vec!["list-tables", "get-methods"]);
    }
}
