#[cfg(test)]
mod tests {
    use crate::{RedditClient, RedditOAuth2Config};
    use serde_json::json;
    use stats_core::{CoreError, ErrorKind, Post, PostSource, RedditApiError};
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN_PATH: &str = "/api/v1/access_token";

    fn create_test_config(server: &MockServer) -> RedditOAuth2Config {
        RedditOAuth2Config::new(
            "test_client_id".to_string(),
            "test_client_secret".to_string(),
            "reddit-stats/1.0 by test_user".to_string(),
        )
        .with_token_url(format!("{}{}", server.uri(), TOKEN_PATH))
    }

    fn create_test_client(server: &MockServer) -> RedditClient {
        RedditClient::new(create_test_config(server), &server.uri(), Some(100)).unwrap()
    }

    fn token_body(token: &str, expires_in: u64) -> serde_json::Value {
        json!({
            "access_token": token,
            "token_type": "bearer",
            "expires_in": expires_in,
            "scope": "*"
        })
    }

    fn listing_body(posts: &[(&str, &str, i64)]) -> serde_json::Value {
        let children: Vec<serde_json::Value> = posts
            .iter()
            .map(|(title, author, ups)| {
                json!({
                    "kind": "t3",
                    "data": {"title": title, "author": author, "ups": ups, "score": ups}
                })
            })
            .collect();
        json!({
            "kind": "Listing",
            "data": {"after": null, "before": null, "dist": children.len(), "children": children}
        })
    }

    async fn mount_token(server: &MockServer, token: &str, expires_in: u64, times: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token, expires_in)))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_token_exchange_uses_basic_auth_and_client_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(header(
                "authorization",
                "Basic dGVzdF9jbGllbnRfaWQ6dGVzdF9jbGllbnRfc2VjcmV0",
            ))
            .and(header("user-agent", "reddit-stats/1.0 by test_user"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1", 86400)))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let credential = client.authenticate().await.unwrap();

        assert_eq!(credential.access_token, "tok-1");
        assert!(!credential.is_expired());
    }

    #[tokio::test]
    async fn test_token_reused_within_validity_window() {
        let server = MockServer::start().await;
        mount_token(&server, "tok-1", 86400, 1).await;

        Mock::given(method("GET"))
            .and(path("/r/rust/hot"))
            .and(header("authorization", "Bearer tok-1"))
            .and(query_param("limit", "100"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(listing_body(&[("T1", "alice", 5), ("T2", "bob", 9)])),
            )
            .expect(2)
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let first = client.fetch_posts("rust").await.unwrap();
        let second = client.fetch_posts("rust").await.unwrap();

        assert_eq!(
            first,
            vec![Post::new("T1", "alice", 5), Post::new("T2", "bob", 9)]
        );
        assert_eq!(first, second);
        assert_eq!(client.token_manager().exchange_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_token_triggers_one_more_exchange() {
        let server = MockServer::start().await;
        // A 60 second lifetime is fully consumed by the safety margin.
        mount_token(&server, "short-lived", 60, 2).await;

        Mock::given(method("GET"))
            .and(path("/r/rust/hot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(&[])))
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        client.fetch_posts("rust").await.unwrap();
        client.fetch_posts("rust").await.unwrap();

        assert_eq!(client.token_manager().exchange_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_listing_is_not_an_error() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 3600, 1).await;

        Mock::given(method("GET"))
            .and(path("/r/quiet/hot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(&[])))
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let posts = client.fetch_hot("quiet").await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_subreddit_404_is_source_not_found() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 3600, 1).await;

        Mock::given(method("GET"))
            .and(path("/r/doesnotexist/hot"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not Found",
                "error": 404
            })))
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let err = client.fetch_posts("doesnotexist").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SourceNotFound);
        if let CoreError::RedditApi(RedditApiError::SubredditNotFound { subreddit }) = err {
            assert_eq!(subreddit, "doesnotexist");
        } else {
            panic!("Expected SubredditNotFound error");
        }
    }

    #[tokio::test]
    async fn test_redirect_to_search_is_source_not_found() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 3600, 1).await;

        Mock::given(method("GET"))
            .and(path("/r/nosuchplace/hot"))
            .respond_with(ResponseTemplate::new(302).insert_header(
                "location",
                format!("{}/subreddits/search.json?q=nosuchplace", server.uri()).as_str(),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/subreddits/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(&[])))
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let err = client.fetch_posts("nosuchplace").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceNotFound);
    }

    #[tokio::test]
    async fn test_token_endpoint_rejection_is_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/rust/hot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(&[])))
            .expect(0)
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let err = client.fetch_posts("rust").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
    }

    #[tokio::test]
    async fn test_malformed_token_body_is_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let err = client.authenticate().await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::RedditApi(RedditApiError::AuthenticationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_token_lifetime_is_auth_error() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 10_000_000_000_000, 1).await;

        let client = create_test_client(&server);
        let err = client.authenticate().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
    }

    #[tokio::test]
    async fn test_server_error_is_fetch_error() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 3600, 1).await;

        Mock::given(method("GET"))
            .and(path("/r/rust/hot"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let err = client.fetch_posts("rust").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert!(matches!(
            err,
            CoreError::RedditApi(RedditApiError::ServerError { status_code: 503 })
        ));
    }

    #[tokio::test]
    async fn test_rejected_token_is_dropped_from_cache() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 86400, 2).await;

        Mock::given(method("GET"))
            .and(path("/r/rust/hot"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let err = client.fetch_posts("rust").await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::RedditApi(RedditApiError::InvalidToken)
        ));

        let _ = client.fetch_posts("rust").await;
        assert_eq!(client.token_manager().exchange_count(), 2);
    }

    #[tokio::test]
    async fn test_path_like_subreddit_name_never_reaches_the_api() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 3600, 0).await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(listing_body(&[("leak", "x", 1)])),
            )
            .expect(0)
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        for name in ["rust/../../secret", "..", "rust?limit=1", "rust#frag", "r%2Fx"] {
            let err = client.fetch_posts(name).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{}", name);
        }
        assert_eq!(client.token_manager().exchange_count(), 0);
    }
}
