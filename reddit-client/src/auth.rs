use chrono::Utc;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, TokenResponse, TokenUrl,
};
use reqwest::Client;
use stats_core::{ConfigError, CoreError, Credential, RedditApiError, DEFAULT_TOKEN_URL};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

// The client-credentials grant never visits the authorize endpoint, but the
// oauth2 client requires one.
const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";

#[derive(Debug, Clone)]
pub struct RedditOAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub token_url: String,
}

impl RedditOAuth2Config {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        Self {
            client_id,
            client_secret,
            user_agent,
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }
}

/// Obtains and caches an application-only bearer token.
///
/// Concurrent callers that all find the cache stale may each perform an
/// exchange; the last one to finish wins the cache slot. That is wasteful but
/// harmless, so no lock is held across the network call.
#[derive(Debug)]
pub struct TokenManager {
    oauth_client: BasicClient,
    http_client: Client,
    cached: RwLock<Option<Credential>>,
    exchanges: AtomicU64,
}

impl TokenManager {
    pub fn new(config: RedditOAuth2Config) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|_| {
            ConfigError::InvalidValue {
                field: "reddit.auth_url".to_string(),
                value: REDDIT_AUTH_URL.to_string(),
            }
        })?;
        let token_url = TokenUrl::new(config.token_url.clone()).map_err(|_| {
            ConfigError::InvalidValue {
                field: "reddit.token_url".to_string(),
                value: config.token_url.clone(),
            }
        })?;

        let oauth_client = BasicClient::new(
            ClientId::new(config.client_id),
            Some(ClientSecret::new(config.client_secret)),
            auth_url,
            Some(token_url),
        );

        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            oauth_client,
            http_client,
            cached: RwLock::new(None),
            exchanges: AtomicU64::new(0),
        })
    }

    /// Return a fresh credential, exchanging for a new one when none is
    /// cached or the cached one has reached its (margin-adjusted) expiry.
    pub async fn ensure_token(&self) -> Result<Credential, CoreError> {
        {
            let cached = self.cached.read().await;
            if let Some(credential) = cached.as_ref() {
                if !credential.is_expired() {
                    debug!("Using cached Reddit access token");
                    return Ok(credential.clone());
                }
                debug!("Cached Reddit access token expired at {}", credential.expires_at);
            }
        }

        let credential = self.exchange().await?;
        *self.cached.write().await = Some(credential.clone());
        Ok(credential)
    }

    /// Drop the cached credential so the next call performs an exchange.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    /// Number of token exchanges performed so far.
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    async fn exchange(&self) -> Result<Credential, CoreError> {
        self.exchanges.fetch_add(1, Ordering::Relaxed);
        let http_client = self.http_client.clone();
        let issued = Utc::now();

        let response = self
            .oauth_client
            .exchange_client_credentials()
            .request_async(move |request| send_token_request(http_client, request))
            .await
            .map_err(|e| {
                error!("Reddit token exchange failed: {}", e);
                RedditApiError::AuthenticationFailed {
                    reason: e.to_string(),
                }
            })?;

        let expires_in = response.expires_in().ok_or_else(|| {
            error!("Reddit token response did not include expires_in");
            RedditApiError::AuthenticationFailed {
                reason: "token response missing expires_in".to_string(),
            }
        })?;

        let credential = Credential::issued_at(
            response.access_token().secret().clone(),
            issued,
            expires_in.as_secs(),
        )
        .map_err(|e| {
            error!("Reddit token response rejected: {}", e);
            e
        })?;
        info!(
            "Obtained Reddit access token valid until {}",
            credential.expires_at
        );
        Ok(credential)
    }
}

// Sends the oauth2-built request through our own client so the configured
// User-Agent is applied; Reddit rejects requests without one.
async fn send_token_request(
    http_client: Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http_client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
