use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use stats_core::{validate_subreddit_name, CoreError, Post, RedditApiError, DEFAULT_API_BASE};
use std::time::Duration;
use tracing::{debug, error, info, warn};

// Reddit answers some unknown subreddit names with a redirect to search
// instead of a 404.
const SEARCH_REDIRECT_PATH: &str = "/subreddits/search";

/// The parts of a Reddit `Listing` envelope the fold reads; other fields are
/// ignored on deserialisation.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditListing<T> {
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingChild<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditPostData {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub ups: i64,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    api_base: String,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Result<Self, CoreError> {
        Self::with_base_url(user_agent, DEFAULT_API_BASE)
    }

    pub fn with_base_url(user_agent: String, api_base: &str) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            user_agent,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.api_base, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        debug!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after })
            }
            StatusCode::UNAUTHORIZED => CoreError::RedditApi(RedditApiError::InvalidToken),
            StatusCode::FORBIDDEN => CoreError::RedditApi(RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            }),
            s if s.is_server_error() => CoreError::RedditApi(RedditApiError::ServerError {
                status_code: s.as_u16(),
            }),
            s => CoreError::RequestFailed {
                message: format!("{} returned {}", endpoint, s),
                status_code: Some(s.as_u16()),
            },
        })
    }

    /// Fetch one page of a subreddit's hot listing.
    pub async fn get_subreddit_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: Option<u32>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        validate_subreddit_name(subreddit)?;
        let endpoint = format!("/r/{}/hot", subreddit);
        let limit_str = limit.map(|l| l.to_string());
        let mut params = Vec::with_capacity(2);
        params.push(("raw_json", "1"));
        if let Some(ref limit_s) = limit_str {
            params.push(("limit", limit_s.as_str()));
        }

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(params.as_slice()))
            .await
            .map_err(|e| match e {
                CoreError::RequestFailed {
                    status_code: Some(404),
                    ..
                } => CoreError::RedditApi(RedditApiError::SubredditNotFound {
                    subreddit: subreddit.to_string(),
                }),
                other => other,
            })?;

        if response.url().path().starts_with(SEARCH_REDIRECT_PATH) {
            warn!("r/{} redirected to subreddit search", subreddit);
            return Err(CoreError::RedditApi(RedditApiError::SubredditNotFound {
                subreddit: subreddit.to_string(),
            }));
        }

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }
}

impl From<RedditPostData> for Post {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            title: post_data.title,
            author: post_data.author,
            upvotes: post_data.ups.max(0) as u64,
        }
    }
}

impl<T> RedditListing<T> {
    pub fn into_items(self) -> Vec<T> {
        self.data
            .children
            .into_iter()
            .map(|child| child.data)
            .collect()
    }
}
