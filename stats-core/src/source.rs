use crate::error::CoreError;
use crate::types::Post;
use async_trait::async_trait;

/// Something that can produce the current hot listing of a subreddit.
///
/// Implementations return posts in listing order. An existing subreddit with
/// no posts yields `Ok(vec![])`; an unknown one yields
/// `RedditApiError::SubredditNotFound`.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_hot(&self, subreddit: &str) -> Result<Vec<Post>, CoreError>;
}
