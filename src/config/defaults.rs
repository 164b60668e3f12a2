pub const DEFAULT_SERVER_URL: &str = "http://localhost:3003";

pub fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

pub fn default_connect_timeout() -> u64 {
    10
}

pub fn default_call_timeout() -> u64 {
    30
}
