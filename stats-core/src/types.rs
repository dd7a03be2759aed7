use crate::error::{CoreError, RedditApiError};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A single post as seen in a subreddit's hot listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub author: String,
    pub upvotes: u64,
}

impl Post {
    pub fn new(title: impl Into<String>, author: impl Into<String>, upvotes: u64) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            upvotes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopAuthor {
    pub name: String,
    pub post_count: u64,
}

/// Margin subtracted from a token's advertised lifetime so it is refreshed
/// before Reddit starts rejecting it.
pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 60;

/// Subreddit names are 2 to 21 characters of `[A-Za-z0-9_]`.
pub const SUBREDDIT_NAME_MAX_LEN: usize = 21;

/// Reject anything that is not a plain subreddit name. The name becomes a URL
/// path segment, so separators and dot segments must never get through.
pub fn validate_subreddit_name(name: &str) -> Result<(), CoreError> {
    let valid = (2..=SUBREDDIT_NAME_MAX_LEN).contains(&name.len())
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');

    if valid {
        Ok(())
    } else {
        Err(CoreError::invalid_input(format!(
            "'{}' is not a valid subreddit name",
            name
        )))
    }
}

/// Bearer credential obtained from the client-credentials exchange.
/// Held in memory only.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential from an exchange response. A lifetime that does not
    /// fit in a timestamp is a malformed token response.
    pub fn issued_at(
        access_token: String,
        issued: DateTime<Utc>,
        expires_in_secs: u64,
    ) -> Result<Self, RedditApiError> {
        let expires_at = i64::try_from(expires_in_secs)
            .ok()
            .map(|lifetime| (lifetime - TOKEN_SAFETY_MARGIN_SECS).max(0))
            .and_then(TimeDelta::try_seconds)
            .and_then(|usable| issued.checked_add_signed(usable))
            .ok_or_else(|| RedditApiError::AuthenticationFailed {
                reason: format!("token lifetime of {}s is out of range", expires_in_secs),
            })?;

        Ok(Self {
            access_token,
            expires_at,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
