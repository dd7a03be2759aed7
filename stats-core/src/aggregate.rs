//! Running statistics over every post observed so far.
//!
//! A single [`PostAggregate`] is created at startup and shared (behind an
//! `Arc`) by the fetch engine, the reporter and the HTTP handlers.

use crate::types::{Post, TopAuthor};
use dashmap::DashMap;
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct PostAggregate {
    author_counts: DashMap<String, u64>,
    top_post: Mutex<Option<Post>>,
}

impl PostAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one post into both statistics.
    ///
    /// The per-author increment holds the map shard lock for that key only.
    /// The top-post comparison and replacement happen under one lock so two
    /// concurrent candidates cannot both win against a stale holder.
    pub fn record(&self, post: &Post) {
        if !post.author.trim().is_empty() {
            *self
                .author_counts
                .entry(post.author.clone())
                .or_insert(0) += 1;
        }

        let mut top = self.top_post.lock();
        let replace = match top.as_ref() {
            None => true,
            Some(current) => post.upvotes > current.upvotes,
        };
        if replace {
            *top = Some(post.clone());
        }
    }

    /// Fold posts in listing order.
    pub fn record_all<'a>(&self, posts: impl IntoIterator<Item = &'a Post>) {
        for post in posts {
            self.record(post);
        }
    }

    pub fn top_post(&self) -> Option<Post> {
        self.top_post.lock().clone()
    }

    /// Author with the most posts. Equal counts resolve to the
    /// lexicographically smallest name so the answer is stable.
    pub fn top_author(&self) -> Option<TopAuthor> {
        self.author_counts
            .iter()
            .max_by(|a, b| a.value().cmp(b.value()).then_with(|| b.key().cmp(a.key())))
            .map(|entry| TopAuthor {
                name: entry.key().clone(),
                post_count: *entry.value(),
            })
    }

    pub fn author_count(&self, author: &str) -> u64 {
        self.author_counts
            .get(author)
            .map(|count| *count)
            .unwrap_or(0)
    }

    pub fn distinct_authors(&self) -> usize {
        self.author_counts.len()
    }
}
