use clap::Parser;
use sse_session::cli::Args;
use sse_session::config::{ClientConfig, FileConfig};
use sse_session::CorrelationMode;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

#[test]
fn test_defaults_without_any_source() {
    let args = Args::parse_from(["sse-session"]);
    let config = ClientConfig::resolve(&args, &FileConfig::default(), env_from(&[])).unwrap();
    assert_eq!(config, ClientConfig::default());
    assert_eq!(config.server_url, "http://localhost:3003");
    assert_eq!(config.correlation, CorrelationMode::Direct);
}

#[test]
fn test_load_yaml_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(
        &path,
        r#"
server:
  url: http://db-host:3005
  correlation: stream
  headers:
    Authorization: "Bearer ${TOKEN}"
timeouts:
  connect: 5
verbose: true
"#,
    )
    .unwrap();

    let file_config = FileConfig::load_from(&path).unwrap();
    let args = Args::parse_from(["sse-session"]);
    let config =
        ClientConfig::resolve(&args, &file_config, env_from(&[("TOKEN", "abc")])).unwrap();

    assert_eq!(config.server_url, "http://db-host:3005");
    assert_eq!(config.correlation, CorrelationMode::Stream);
    assert_eq!(config.connect_timeout_secs, 5);
    assert_eq!(config.call_timeout_secs, 30);
    assert!(config.verbose);
    assert_eq!(config.headers["Authorization"], "Bearer abc");
}

#[test]
fn test_load_json_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"server": {"url": "http://json-host:3003"}, "timeouts": {"call": 7}}"#,
    )
    .unwrap();

    let file_config = FileConfig::load_from(&path).unwrap();
    assert_eq!(file_config.server.url.as_deref(), Some("http://json-host:3003"));
    assert_eq!(file_config.timeouts.call, Some(7));
    assert_eq!(file_config.server.correlation, None);
}

#[test]
fn test_invalid_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "server: [not, a, map").unwrap();

    let err = FileConfig::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse YAML config file"));
}

#[test]
fn test_precedence_args_over_env_over_file() {
    let file_config: FileConfig = serde_yaml::from_str(
        r#"
server:
  url: http://from-file:1
  correlation: direct
  headers:
    X-Source: file
    X-Keep: file
timeouts:
  connect: 1
  call: 1
"#,
    )
    .unwrap();
    let env = env_from(&[
        ("SSE_SESSION_URL", "http://from-env:2"),
        ("SSE_SESSION_CORRELATION", "stream"),
        ("SSE_SESSION_CONNECT_TIMEOUT", "2"),
        ("SSE_SESSION_CALL_TIMEOUT", "2"),
    ]);
    let args = Args::parse_from([
        "sse-session",
        "--url",
        "http://from-args:3",
        "--call-timeout",
        "3",
        "-H",
        "X-Source=args",
    ]);

    let config = ClientConfig::resolve(&args, &file_config, env).unwrap();
    assert_eq!(config.server_url, "http://from-args:3");
    assert_eq!(config.correlation, CorrelationMode::Stream);
    assert_eq!(config.connect_timeout_secs, 2);
    assert_eq!(config.call_timeout_secs, 3);
    assert_eq!(config.headers["X-Source"], "args");
    assert_eq!(config.headers["X-Keep"], "file");
}

#[test]
fn test_invalid_env_mode_is_rejected() {
    let args = Args::parse_from(["sse-session"]);
    let result = ClientConfig::resolve(
        &args,
        &FileConfig::default(),
        env_from(&[("SSE_SESSION_CORRELATION", "carrier-pigeon")]),
    );
    assert!(result.is_err());
}

#[test]
fn test_write_example_does_not_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.yaml");

    assert!(FileConfig::write_example(&path).unwrap());
    let written = FileConfig::load_from(&path).unwrap();
    assert_eq!(written.server.correlation, Some(CorrelationMode::Direct));
    assert_eq!(
        written.server.headers["Authorization"],
        "Bearer ${SSE_SESSION_TOKEN}"
    );

    fs::write(&path, "verbose: true\n").unwrap();
    assert!(!FileConfig::write_example(&path).unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), "verbose: true\n");
}

#[test]
fn test_invalid_env_timeouts_are_rejected() {
    let args = Args::parse_from(["sse-session"]);
    for name in ["SSE_SESSION_CONNECT_TIMEOUT", "SSE_SESSION_CALL_TIMEOUT"] {
        let err = ClientConfig::resolve(&args, &FileConfig::default(), env_from(&[(name, "ten")]))
            .unwrap_err();
        assert!(err.to_string().contains(name), "{}", err);
    }

    // An explicit argument wins before the environment is consulted
    let args = Args::parse_from(["sse-session", "--connect-timeout", "4"]);
    let config = ClientConfig::resolve(
        &args,
        &FileConfig::default(),
        env_from(&[("SSE_SESSION_CONNECT_TIMEOUT", "ten")]),
    )
    .unwrap();
    assert_eq!(config.connect_timeout_secs, 4);
}
