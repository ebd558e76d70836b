//! End-to-end provider tests against a local HTTP server.
//!
//! These tests run the real `reqwest::Client` transport against `wiremock`
//! servers standing in for the GitHub and GitLab APIs. The providers are
//! pointed at the mock server through their `api_base`; the repository URLs
//! keep the public hosts so host matching behaves as in production.

use std::sync::Arc;
use std::time::Duration;

use headwatch::forge::github::GitHubProvider;
use headwatch::forge::gitlab::GitLabProvider;
use headwatch::forge::{
    Auth, ErrorOp, GenericProvider, HostSet, Provider, ProviderRegistry,
};
use headwatch::http::{CancelSignal, HttpTransport};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHA: &str = "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d";
const GITLAB_ID: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

fn client() -> Arc<dyn HttpTransport> {
    Arc::new(reqwest::Client::new())
}

fn github(server: &MockServer) -> GitHubProvider {
    GitHubProvider::with_api_base(client(), HostSet::new(["github.com"]), server.uri())
}

fn gitlab(server: &MockServer) -> GitLabProvider {
    GitLabProvider::with_api_base(
        client(),
        HostSet::new(["gitlab.com"]),
        format!("{}/api/v4", server.uri()),
    )
}

// =============================================================================
// GitHub
// =============================================================================

mod github_api {
    use super::*;

    #[tokio::test]
    async fn resolves_branch_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/commits/master"))
            .and(header("Authorization", "token abc"))
            .and(header("Accept", "application/vnd.github.v3+json"))
            .and(header("User-Agent", "Watchtower-Git-Monitor"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"{{"sha":"{}","otherField":1}}"#, SHA)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let sha = github(&server)
            .get_latest_commit(
                &CancelSignal::new(),
                "https://github.com/octocat/Hello-World",
                "master",
                &Auth::token("abc"),
            )
            .await
            .unwrap();

        assert_eq!(sha, SHA);
    }

    #[tokio::test]
    async fn not_found_without_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/commits/main"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let err = github(&server)
            .get_latest_commit(
                &CancelSignal::new(),
                "https://github.com/octocat/Hello-World.git",
                "main",
                &Auth::None,
            )
            .await
            .unwrap_err();

        assert_eq!(err.op(), ErrorOp::Api);
        assert_eq!(err.url(), "https://github.com/octocat/Hello-World.git");
        assert_eq!(err.reason(), "repository or reference not found");

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn one_segment_path_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = github(&server)
            .get_latest_commit(
                &CancelSignal::new(),
                "https://github.com/only-one-segment",
                "main",
                &Auth::None,
            )
            .await
            .unwrap_err();

        assert_eq!(err.op(), ErrorOp::Parse);
        assert!(err.reason().contains("URL path must have at least 2 parts"));
    }

    #[tokio::test]
    async fn rate_limit_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_string(r#"{"message":"API rate limit exceeded for 127.0.0.1."}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = github(&server)
            .get_latest_commit(&CancelSignal::new(), "https://github.com/a/b", "main", &Auth::None)
            .await
            .unwrap_err();

        assert_eq!(err.reason(), "API error: API rate limit exceeded for 127.0.0.1.");
    }

    #[tokio::test]
    async fn slash_in_ref_is_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/a/b/commits/release/1.x"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"sha":"abc"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let sha = github(&server)
            .get_latest_commit(&CancelSignal::new(), "https://github.com/a/b", "release/1.x", &Auth::None)
            .await
            .unwrap();
        assert_eq!(sha, "abc");
    }

    #[tokio::test]
    async fn deadline_aborts_slow_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"sha":"abc"}"#)
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let cancel = CancelSignal::with_timeout(Duration::from_millis(100));
        let err = github(&server)
            .get_latest_commit(&cancel, "https://github.com/a/b", "main", &Auth::None)
            .await
            .unwrap_err();

        assert_eq!(err.op(), ErrorOp::Api);
        assert_eq!(err.reason(), "network error");
    }
}

// =============================================================================
// GitLab
// =============================================================================

mod gitlab_api {
    use super::*;

    #[tokio::test]
    async fn resolves_tag_in_nested_group() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/api/v4/projects/group%2Fsub%2Fproj/repository/commits/v1.0",
            ))
            .and(header("Private-Token", "tok"))
            .and(header("User-Agent", "Watchtower-Git-Monitor"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!(r#"{{"id":"{}"}}"#, GITLAB_ID)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = gitlab(&server)
            .get_latest_commit(
                &CancelSignal::new(),
                "https://gitlab.com/group/sub/proj.git",
                "v1.0",
                &Auth::token("tok"),
            )
            .await
            .unwrap();

        assert_eq!(id, GITLAB_ID);
    }

    #[tokio::test]
    async fn unauthorized_body_is_surfaced_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .expect(1)
            .mount(&server)
            .await;

        let err = gitlab(&server)
            .get_latest_commit(&CancelSignal::new(), "https://gitlab.com/g/p", "x", &Auth::None)
            .await
            .unwrap_err();

        assert_eq!(err.op(), ErrorOp::Api);
        assert_eq!(err.url(), "https://gitlab.com/g/p");
        assert_eq!(err.reason(), "API error: unauthorized");
    }

    #[tokio::test]
    async fn basic_auth_sends_no_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"abc"}"#))
            .expect(1)
            .mount(&server)
            .await;

        gitlab(&server)
            .get_latest_commit(
                &CancelSignal::new(),
                "https://gitlab.com/g/p",
                "main",
                &Auth::basic("user", "pass"),
            )
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        assert!(received[0].headers.get("authorization").is_none());
        assert!(received[0].headers.get("private-token").is_none());
    }
}

// =============================================================================
// Dispatch
// =============================================================================

mod dispatch {
    use super::*;

    fn registry(server: &MockServer) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(github(server)));
        registry.register(Arc::new(gitlab(server)));
        registry.register(Arc::new(GenericProvider::new()));
        registry
    }

    #[tokio::test]
    async fn unknown_host_falls_through_to_generic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = registry(&server)
            .resolve(&CancelSignal::new(), "https://example.com/a/b", "main", &Auth::None)
            .await
            .unwrap_err();

        assert_eq!(err.op(), ErrorOp::Generic);
        assert_eq!(err.reason(), "generic provider delegates to go-git");
    }

    #[tokio::test]
    async fn repeated_resolves_are_identical() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/a/b/commits/main"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(r#"{{"sha":"{}"}}"#, SHA)))
            .expect(2)
            .mount(&server)
            .await;

        let registry = registry(&server);
        let cancel = CancelSignal::new();
        let first = registry
            .resolve(&cancel, "https://github.com/a/b", "main", &Auth::None)
            .await
            .unwrap();
        let second = registry
            .resolve(&cancel, "https://github.com/a/b", "main", &Auth::None)
            .await
            .unwrap();

        assert_eq!(first, SHA);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn concurrent_resolves_share_registry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"sha":"abc","id":"def"}"#))
            .expect(4)
            .mount(&server)
            .await;

        let registry = Arc::new(registry(&server));
        let mut handles = Vec::new();
        for url in [
            "https://github.com/a/b",
            "https://gitlab.com/g/p",
            "https://github.com/c/d",
            "https://gitlab.com/h/q",
        ] {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .resolve(&CancelSignal::new(), url, "main", &Auth::None)
                    .await
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }
        assert_eq!(results, ["abc", "def", "abc", "def"]);
    }
}
