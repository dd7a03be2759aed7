//! Application configuration: an optional TOML file overlaid by environment
//! variables.

use crate::error::{ConfigError, CoreError};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "reddit-stats.toml";
pub const DEFAULT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";

pub const ENV_CONFIG_PATH: &str = "REDDIT_STATS_CONFIG";
pub const ENV_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
pub const ENV_USER_AGENT: &str = "REDDIT_USER_AGENT";
pub const ENV_BIND: &str = "REDDIT_STATS_BIND";
pub const ENV_POLL_SECONDS: &str = "REDDIT_STATS_POLL_SECONDS";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub reddit: RedditConfig,
    pub server: ServerConfig,
    pub reporter: ReporterConfig,
}

#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub token_url: String,
    pub api_base: String,
    pub listing_limit: u32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub tick_interval: Duration,
    pub max_requests: u32,
    pub window_length: Duration,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            max_requests: 60,
            window_length: Duration::from_secs(600),
        }
    }
}

// On-disk shape. Every field is optional so a partial file can be completed
// from the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    reddit: FileRedditConfig,
    #[serde(default)]
    server: FileServerConfig,
    #[serde(default)]
    reporter: FileReporterConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileRedditConfig {
    client_id: Option<String>,
    client_secret: Option<String>,
    user_agent: Option<String>,
    token_url: Option<String>,
    api_base: Option<String>,
    listing_limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileServerConfig {
    bind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileReporterConfig {
    tick_seconds: Option<u64>,
    max_requests: Option<u32>,
    window_seconds: Option<u64>,
}

impl AppConfig {
    /// Load from `path` (or `$REDDIT_STATS_CONFIG`, or the default file name)
    /// and the process environment. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var(ENV_CONFIG_PATH)
                .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
                .into(),
        };

        let contents = if path.exists() {
            info!("Loading configuration from {}", path.display());
            Some(std::fs::read_to_string(&path)?)
        } else {
            debug!("No configuration file at {}, using environment", path.display());
            None
        };

        Self::from_sources(contents.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build a config from optional TOML text and an environment lookup.
    pub fn from_sources<F>(toml_text: Option<&str>, env: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: FileConfig = match toml_text {
            Some(text) => toml::from_str(text).map_err(ConfigError::from)?,
            None => FileConfig::default(),
        };

        let client_id = required(env(ENV_CLIENT_ID).or(file.reddit.client_id), "reddit.client_id")?;
        let client_secret = required(
            env(ENV_CLIENT_SECRET).or(file.reddit.client_secret),
            "reddit.client_secret",
        )?;
        let user_agent = required(
            env(ENV_USER_AGENT).or(file.reddit.user_agent),
            "reddit.user_agent",
        )?;

        let listing_limit = file.reddit.listing_limit.unwrap_or(100);
        if listing_limit == 0 || listing_limit > 100 {
            return Err(invalid("reddit.listing_limit", listing_limit));
        }

        let bind_text = env(ENV_BIND)
            .or(file.server.bind)
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let bind = bind_text
            .parse::<SocketAddr>()
            .map_err(|_| invalid("server.bind", &bind_text))?;

        let tick_seconds = match env(ENV_POLL_SECONDS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid("reporter.tick_seconds", &raw))?,
            None => file.reporter.tick_seconds.unwrap_or(60),
        };
        if tick_seconds == 0 {
            return Err(invalid("reporter.tick_seconds", tick_seconds));
        }

        let max_requests = file.reporter.max_requests.unwrap_or(60);
        if max_requests == 0 {
            return Err(invalid("reporter.max_requests", max_requests));
        }

        let window_seconds = file.reporter.window_seconds.unwrap_or(600);
        if window_seconds == 0 {
            return Err(invalid("reporter.window_seconds", window_seconds));
        }

        Ok(Self {
            reddit: RedditConfig {
                client_id,
                client_secret,
                user_agent,
                token_url: file
                    .reddit
                    .token_url
                    .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
                api_base: file
                    .reddit
                    .api_base
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                listing_limit,
            },
            server: ServerConfig { bind },
            reporter: ReporterConfig {
                tick_interval: Duration::from_secs(tick_seconds),
                max_requests,
                window_length: Duration::from_secs(window_seconds),
            },
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ConfigError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingField {
            field: field.to_string(),
        }),
    }
}

fn invalid(field: &str, value: impl ToString) -> CoreError {
    CoreError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const CREDENTIALS: &[(&str, &str)] = &[
        (ENV_CLIENT_ID, "id"),
        (ENV_CLIENT_SECRET, "secret"),
        (ENV_USER_AGENT, "reddit-stats/0.1 by tester"),
    ];

    #[test]
    fn test_defaults_from_environment_only() {
        let config = AppConfig::from_sources(None, env_of(CREDENTIALS)).unwrap();

        assert_eq!(config.reddit.client_id, "id");
        assert_eq!(config.reddit.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.reddit.api_base, DEFAULT_API_BASE);
        assert_eq!(config.reddit.listing_limit, 100);
        assert_eq!(config.server.bind, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.reporter.tick_interval, Duration::from_secs(60));
        assert_eq!(config.reporter.max_requests, 60);
        assert_eq!(config.reporter.window_length, Duration::from_secs(600));
    }

    #[test]
    fn test_environment_overrides_file() {
        let toml_text = r#"
            [reddit]
            client_id = "file-id"
            client_secret = "file-secret"
            user_agent = "file-agent"
            listing_limit = 25

            [server]
            bind = "127.0.0.1:9000"

            [reporter]
            tick_seconds = 5
            max_requests = 3
            window_seconds = 30
        "#;
        let env = env_of(&[(ENV_CLIENT_ID, "env-id"), (ENV_POLL_SECONDS, "7")]);
        let config = AppConfig::from_sources(Some(toml_text), env).unwrap();

        assert_eq!(config.reddit.client_id, "env-id");
        assert_eq!(config.reddit.client_secret, "file-secret");
        assert_eq!(config.reddit.listing_limit, 25);
        assert_eq!(config.server.bind, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.reporter.tick_interval, Duration::from_secs(7));
        assert_eq!(config.reporter.max_requests, 3);
        assert_eq!(config.reporter.window_length, Duration::from_secs(30));
    }

    #[test]
    fn test_blank_secret_is_missing() {
        let env = env_of(&[
            (ENV_CLIENT_ID, "id"),
            (ENV_CLIENT_SECRET, "   "),
            (ENV_USER_AGENT, "agent"),
        ]);
        let err = AppConfig::from_sources(None, env).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::MissingField { ref field }) if field == "reddit.client_secret"
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AppConfig::from_sources(Some("[reporter]\nmax_requests = 0"), env_of(CREDENTIALS))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidValue { .. })
        ));

        let mut pairs = CREDENTIALS.to_vec();
        pairs.push((ENV_BIND, "not-an-address"));
        let err = AppConfig::from_sources(None, env_of(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "server.bind"
        ));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let err = AppConfig::from_sources(Some("[reddit\nclient_id ="), env_of(CREDENTIALS))
            .unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::Parse(_))));
    }
}
