use anyhow::{Context, Result};
use uuid::Uuid;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub completion_host: String,
    pub completion_api_key: String,
    /// Request-id header value sent with every completion call. A fresh
    /// UUID-suffixed id is generated when none is configured.
    pub request_id: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let host = require_env("COMPLETION_HOST")?;

        Ok(Config {
            completion_host: normalize_host(&host),
            completion_api_key: require_env("COMPLETION_API_KEY")?,
            request_id: std::env::var("COMPLETION_REQUEST_ID")
                .unwrap_or_else(|_| format!("analyzer-{}", Uuid::new_v4())),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Prepends https:// when the configured host carries no scheme.
fn normalize_host(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host_adds_scheme() {
        assert_eq!(
            normalize_host("completion.example.com"),
            "https://completion.example.com"
        );
    }

    #[test]
    fn test_normalize_host_keeps_existing_scheme() {
        assert_eq!(
            normalize_host("http://localhost:8080"),
            "http://localhost:8080"
        );
        assert_eq!(
            normalize_host("https://completion.example.com"),
            "https://completion.example.com"
        );
    }

    #[test]
    fn test_normalize_host_strips_trailing_slash() {
        assert_eq!(
            normalize_host("https://completion.example.com/"),
            "https://completion.example.com"
        );
    }
}
