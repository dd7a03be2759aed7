use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Request failed: {message}")]
    RequestFailed {
        message: String,
        status_code: Option<u16>,
    },
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Subreddit not found: {subreddit}")]
    SubredditNotFound { subreddit: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Coarse classification of a failure, used by callers that need to branch
/// on what went wrong rather than on which enum carried it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Token exchange failed.
    Auth,
    /// The listing API reported an unknown subreddit.
    SourceNotFound,
    /// Any other transport or parsing failure while fetching posts.
    Fetch,
    /// A caller supplied a missing or blank parameter.
    Validation,
    Config,
    Internal,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed { .. }) => ErrorKind::Auth,
            CoreError::RedditApi(RedditApiError::SubredditNotFound { .. }) => {
                ErrorKind::SourceNotFound
            }
            CoreError::RedditApi(_)
            | CoreError::Network(_)
            | CoreError::Serialization(_)
            | CoreError::RequestFailed { .. } => ErrorKind::Fetch,
            CoreError::InvalidInput { .. } => ErrorKind::Validation,
            CoreError::Config(_) => ErrorKind::Config,
            CoreError::Io(_) | CoreError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            message: message.into(),
        }
    }

    /// Stable machine-readable code, used in logs and HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::RedditApi(e) => match e {
                RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED",
                RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT",
                RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN",
                RedditApiError::SubredditNotFound { .. } => "REDDIT_SUBREDDIT_NOT_FOUND",
                RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN",
                RedditApiError::RequestTimeout => "REDDIT_TIMEOUT",
                RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE",
                RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR",
            },
            CoreError::Config(e) => match e {
                ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD",
                ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
                ConfigError::Parse(_) => "CONFIG_PARSE_ERROR",
            },
            CoreError::Io(_) => "IO",
            CoreError::Serialization(_) => "SERIALIZATION",
            CoreError::Network(_) => "NETWORK",
            CoreError::InvalidInput { .. } => "INVALID_INPUT",
            CoreError::Internal { .. } => "INTERNAL",
            CoreError::RequestFailed { .. } => "REQUEST_FAILED",
        }
    }

    /// Message safe to hand to an HTTP caller. Credentials, upstream bodies
    /// and local paths stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => match e {
                RedditApiError::AuthenticationFailed { .. } => {
                    "The service could not obtain a Reddit access token.".to_string()
                }
                RedditApiError::RateLimitExceeded { retry_after } => format!(
                    "Reddit is rate limiting this service; it asked for a {}s pause.",
                    retry_after
                ),
                RedditApiError::Forbidden { .. } => {
                    "Reddit refused access; the subreddit may be private or quarantined."
                        .to_string()
                }
                RedditApiError::SubredditNotFound { subreddit } => {
                    format!("Subreddit '{}' does not exist.", subreddit)
                }
                RedditApiError::InvalidToken => {
                    "Reddit rejected the access token; a new one is requested on the next fetch."
                        .to_string()
                }
                RedditApiError::RequestTimeout => "Reddit did not answer in time.".to_string(),
                RedditApiError::InvalidResponse { .. } => {
                    "Reddit returned a listing that could not be read.".to_string()
                }
                RedditApiError::ServerError { status_code } => {
                    format!("Reddit answered with server error {}.", status_code)
                }
            },
            CoreError::Network(_) | CoreError::RequestFailed { .. } => {
                "The request to Reddit failed.".to_string()
            }
            CoreError::InvalidInput { message } => message.clone(),
            CoreError::Config(_)
            | CoreError::Io(_)
            | CoreError::Serialization(_)
            | CoreError::Internal { .. } => "Internal server error.".to_string(),
        }
    }
}
