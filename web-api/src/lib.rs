//! HTTP surface over the post aggregate.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/reddit/posts?subreddits=a,b` | Fetch the named subreddits into the aggregate. |
//! | `GET`  | `/api/reddit/top-post` | Highest-upvoted post seen so far. |
//! | `GET`  | `/api/reddit/top-user` | Author with the most posts seen so far. |
//! | `GET`  | `/health` | Liveness check. |

pub mod error;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::{build_router, parse_subreddits, AppState};
