use futures::future::join_all;
use stats_core::{CoreError, Post, PostAggregate, PostSource, TopAuthor};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Pulls hot listings from a [`PostSource`] and folds them into the shared
/// [`PostAggregate`].
pub struct FetchEngine {
    source: Arc<dyn PostSource>,
    aggregate: Arc<PostAggregate>,
}

impl FetchEngine {
    pub fn new(source: Arc<dyn PostSource>, aggregate: Arc<PostAggregate>) -> Self {
        Self { source, aggregate }
    }

    pub fn aggregate(&self) -> &Arc<PostAggregate> {
        &self.aggregate
    }

    /// Fetch one subreddit and fold every post, in listing order.
    ///
    /// On failure nothing from this subreddit reaches the aggregate.
    pub async fn fetch_source(&self, subreddit: &str) -> Result<Vec<Post>, CoreError> {
        debug!(subreddit = %subreddit, "Fetching hot posts");

        let posts = self.source.fetch_hot(subreddit).await.map_err(|e| {
            error!(subreddit = %subreddit, code = e.code(), "Fetch failed: {}", e);
            e
        })?;

        if posts.is_empty() {
            warn!(subreddit = %subreddit, "Subreddit returned no posts");
        } else {
            info!(subreddit = %subreddit, count = posts.len(), "Folding posts into aggregate");
        }

        self.aggregate.record_all(&posts);
        Ok(posts)
    }

    /// Fetch every subreddit concurrently and wait for all of them.
    ///
    /// If any fetch failed, the first failure (in argument order) is returned
    /// once every fetch has settled. Posts from successful fetches stay in
    /// the aggregate either way.
    pub async fn fetch_all(&self, subreddits: &[String]) -> Result<(), CoreError> {
        let span = info_span!("fetch_all", batch = %Uuid::new_v4(), sources = subreddits.len());

        async {
            let results = join_all(subreddits.iter().map(|name| self.fetch_source(name))).await;

            let mut first_error = None;
            let mut failed = 0usize;
            for result in results {
                if let Err(e) = result {
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }

            match first_error {
                Some(e) => {
                    warn!(failed, total = subreddits.len(), "Fetch batch finished with errors");
                    Err(e)
                }
                None => {
                    info!(total = subreddits.len(), "Fetch batch finished");
                    Ok(())
                }
            }
        }
        .instrument(span)
        .await
    }

    pub fn top_post(&self) -> Option<Post> {
        self.aggregate.top_post()
    }

    pub fn top_author(&self) -> Option<TopAuthor> {
        self.aggregate.top_author()
    }
}
