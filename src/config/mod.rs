pub mod defaults;
mod server;
mod validation;

use crate::cli::{parse_header, Args};
use crate::rpc::CorrelationMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use server::{ServerConfig, TimeoutConfig};
pub use validation::{expand_env_var_in_string, expand_env_vars};

/// Fully resolved client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub server_url: String,
    pub correlation: CorrelationMode,
    pub connect_timeout_secs: u64,
    pub call_timeout_secs: u64,
    pub headers: HashMap<String, String>,
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: defaults::default_server_url(),
            correlation: CorrelationMode::default(),
            connect_timeout_secs: defaults::default_connect_timeout(),
            call_timeout_secs: defaults::default_call_timeout(),
            headers: HashMap::new(),
            verbose: false,
        }
    }
}

/// On-disk configuration, YAML or JSON.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub verbose: Option<bool>,
}

impl ClientConfig {
    pub fn from_env_and_args(args: &Args) -> Result<Self> {
        let file_config = match &args.config {
            Some(path) => FileConfig::load_from(path)?,
            None => FileConfig::load()?,
        };
        Self::resolve(args, &file_config, |name| env::var(name).ok())
    }

    /// Merge settings: CLI args > env vars > config file > defaults.
    pub fn resolve(
        args: &Args,
        file_config: &FileConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let server_url = args
            .url
            .clone()
            .or_else(|| lookup("SSE_SESSION_URL"))
            .or(file_config.server.url.clone())
            .unwrap_or_else(defaults::default_server_url);

        let correlation = match args.mode {
            Some(mode) => mode,
            None => match lookup("SSE_SESSION_CORRELATION") {
                Some(value) => value
                    .parse::<CorrelationMode>()
                    .map_err(anyhow::Error::msg)
                    .context("Invalid SSE_SESSION_CORRELATION")?,
                None => file_config.server.correlation.unwrap_or_default(),
            },
        };

        let connect_timeout_secs = match args.connect_timeout {
            Some(secs) => secs,
            None => env_secs(&lookup, "SSE_SESSION_CONNECT_TIMEOUT")?
                .or(file_config.timeouts.connect)
                .unwrap_or_else(defaults::default_connect_timeout),
        };

        let call_timeout_secs = match args.call_timeout {
            Some(secs) => secs,
            None => env_secs(&lookup, "SSE_SESSION_CALL_TIMEOUT")?
                .or(file_config.timeouts.call)
                .unwrap_or_else(defaults::default_call_timeout),
        };

        let verbose = args.verbose
            || lookup("SSE_SESSION_VERBOSE")
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
                .or(file_config.verbose)
                .unwrap_or(false);

        // File headers first so CLI headers override them
        let mut headers = expand_env_vars(&file_config.server.headers, &lookup);
        for raw in &args.headers {
            let (name, value) = parse_header(raw)?;
            headers.insert(name, expand_env_var_in_string(&value, &lookup));
        }

        Ok(ClientConfig {
            server_url,
            correlation,
            connect_timeout_secs,
            call_timeout_secs,
            headers,
            verbose,
        })
    }
}

/// Read a whole number of seconds from `name`. Set but unparsable is an error.
fn env_secs(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<u64>> {
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid {}: '{}'", name, value))
        })
        .transpose()
}

impl FileConfig {
    /// Load the first config file found in the search path, or defaults if none exists.
    pub fn load() -> Result<Self> {
        for path in Self::get_config_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        // No config file found, return default
        Ok(FileConfig::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config file: {}", path.display()))
        } else {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config file: {}", path.display()))
        }
    }

    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Current directory (highest priority - local override)
        paths.push(PathBuf::from(".sse-session.yaml"));
        paths.push(PathBuf::from(".sse-session.yml"));
        paths.push(PathBuf::from(".sse-session.json"));

        // 2. User's config directory (global config)
        if let Some(config_dir) = Self::user_config_dir() {
            paths.push(config_dir.join("config.yaml"));
            paths.push(config_dir.join("config.yml"));
            paths.push(config_dir.join("config.json"));
        }

        paths
    }

    pub fn user_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("sse-session"))
    }

    pub fn example() -> Self {
        FileConfig {
            server: ServerConfig {
                url: Some(defaults::default_server_url()),
                correlation: Some(CorrelationMode::Direct),
                headers: HashMap::from([(
                    "Authorization".to_string(),
                    "Bearer ${SSE_SESSION_TOKEN}".to_string(),
                )]),
            },
            timeouts: TimeoutConfig {
                connect: Some(defaults::default_connect_timeout()),
                call: Some(defaults::default_call_timeout()),
            },
            verbose: Some(false),
        }
    }

    /// Write the example config to `path` unless a file is already there.
    pub fn write_example(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = serde_yaml::to_string(&Self::example())?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(true)
    }
}
