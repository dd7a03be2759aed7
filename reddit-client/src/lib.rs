pub mod api;
pub mod auth;

#[cfg(test)]
mod tests;

pub use api::{RedditApiClient, RedditListing, RedditPostData};
pub use auth::{RedditOAuth2Config, TokenManager};

use async_trait::async_trait;
use stats_core::{
    validate_subreddit_name, CoreError, Credential, Post, PostSource, RedditApiError, RedditConfig,
};
use tracing::warn;

/// Application-only Reddit client: a token manager plus the listing API.
#[derive(Debug)]
pub struct RedditClient {
    token_manager: TokenManager,
    api: RedditApiClient,
    listing_limit: Option<u32>,
}

impl RedditClient {
    pub fn new(
        config: RedditOAuth2Config,
        api_base: &str,
        listing_limit: Option<u32>,
    ) -> Result<Self, CoreError> {
        let api = RedditApiClient::with_base_url(config.user_agent.clone(), api_base)?;
        let token_manager = TokenManager::new(config)?;

        Ok(Self {
            token_manager,
            api,
            listing_limit,
        })
    }

    pub fn from_config(config: &RedditConfig) -> Result<Self, CoreError> {
        let oauth = RedditOAuth2Config::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.user_agent.clone(),
        )
        .with_token_url(config.token_url.clone());

        Self::new(oauth, &config.api_base, Some(config.listing_limit))
    }

    pub async fn authenticate(&self) -> Result<Credential, CoreError> {
        self.token_manager.ensure_token().await
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.token_manager
    }

    /// Fetch the hot listing of `subreddit`, re-validating the token first.
    pub async fn fetch_posts(&self, subreddit: &str) -> Result<Vec<Post>, CoreError> {
        validate_subreddit_name(subreddit)?;
        let credential = self.authenticate().await?;

        let listing = match self
            .api
            .get_subreddit_posts(&credential.access_token, subreddit, self.listing_limit)
            .await
        {
            Ok(listing) => listing,
            Err(CoreError::RedditApi(RedditApiError::InvalidToken)) => {
                warn!("Reddit rejected the cached token, dropping it");
                self.token_manager.invalidate().await;
                return Err(CoreError::RedditApi(RedditApiError::InvalidToken));
            }
            Err(e) => return Err(e),
        };

        Ok(listing.into_items().into_iter().map(Post::from).collect())
    }
}

#[async_trait]
impl PostSource for RedditClient {
    async fn fetch_hot(&self, subreddit: &str) -> Result<Vec<Post>, CoreError> {
        self.fetch_posts(subreddit).await
    }
}
