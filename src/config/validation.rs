use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"))
}

/// Expand `${VAR_NAME}` references using `lookup`. Unknown variables are left as written.
pub fn expand_env_var_in_string(value: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    env_var_pattern()
        .replace_all(value, |cap: &regex::Captures| {
            lookup(&cap[1]).unwrap_or_else(|| cap[0].to_string())
        })
        .into_owned()
}

/// Expand environment variables in every header value
pub fn expand_env_vars(
    headers: &HashMap<String, String>,
    lookup: &impl Fn(&str) -> Option<String>,
) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(key, value)| (key.clone(), expand_env_var_in_string(value, lookup)))
        .collect()
}
