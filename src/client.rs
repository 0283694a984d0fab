//! Blocking HTTP client for the git backend service.
//!
//! Calls run on worker threads, never on the UI loop. Error-status
//! responses are returned as [`RawResponse`] so the classifier can inspect
//! their bodies; only io-level failures surface as `Err`.

use std::time::Duration;

use serde_json::json;

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
}

impl BackendConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("GITDECK_BACKEND_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());
        Self::new(&base_url)
    }

    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// A completed HTTP exchange, prior to classification.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Clone)]
pub struct BackendClient {
    agent: ureq::Agent,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(60))
            .build();
        Self {
            agent,
            base_url: config.base_url.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn status(&self) -> Result<RawResponse, String> {
        self.get("/status")
    }

    pub fn stage_all(&self) -> Result<RawResponse, String> {
        self.get("/add")
    }

    pub fn commit(&self, message: &str) -> Result<RawResponse, String> {
        self.post_json("/commit", json!({ "message": message }))
    }

    pub fn push(&self) -> Result<RawResponse, String> {
        self.get("/push")
    }

    pub fn pull(&self) -> Result<RawResponse, String> {
        self.get("/pull")
    }

    pub fn log(&self) -> Result<RawResponse, String> {
        self.get("/log")
    }

    pub fn init_repository(&self) -> Result<RawResponse, String> {
        self.get("/git-init")
    }

    pub fn list_branches(&self) -> Result<RawResponse, String> {
        self.get("/git-branches")
    }

    pub fn create_branch(&self, name: &str) -> Result<RawResponse, String> {
        self.post_json("/git-branch-create", json!({ "name": name }))
    }

    pub fn checkout(&self, branch: &str) -> Result<RawResponse, String> {
        self.post_json("/git-checkout", json!({ "branch": branch }))
    }

    pub fn list_remotes(&self) -> Result<RawResponse, String> {
        self.get("/git-remotes")
    }

    pub fn add_remote(&self, name: &str, url: &str) -> Result<RawResponse, String> {
        self.post_json("/git-remote-add", json!({ "name": name, "url": url }))
    }

    pub fn switch_repository(&self, directory: &str) -> Result<RawResponse, String> {
        self.post_json("/switch-repository", json!({ "directory": directory }))
    }

    pub fn pick_directory(&self) -> Result<RawResponse, String> {
        self.get("/select-directory-dialog")
    }

    pub fn list_repositories(&self) -> Result<RawResponse, String> {
        self.get("/get-repositories")
    }

    pub fn shutdown(&self) -> Result<RawResponse, String> {
        self.post_json("/shutdown", json!({}))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> Result<RawResponse, String> {
        complete(self.agent.get(&self.url(path)).call())
    }

    fn post_json(&self, path: &str, body: serde_json::Value) -> Result<RawResponse, String> {
        complete(self.agent.post(&self.url(path)).send_json(body))
    }
}

fn complete(res: Result<ureq::Response, ureq::Error>) -> Result<RawResponse, String> {
    match res {
        Ok(r) => {
            let status = r.status();
            let body = r.into_string().map_err(|e| e.to_string())?;
            Ok(RawResponse { status, body })
        }
        Err(ureq::Error::Status(status, r)) => {
            let body = r.into_string().unwrap_or_default();
            Ok(RawResponse { status, body })
        }
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Outcome, classify};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn config_strips_trailing_slash() {
        let config = BackendConfig::new("http://127.0.0.1:5000/");
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
    }

    #[test]
    fn urls_are_joined_against_base() {
        let client = BackendClient::new(&BackendConfig::new("http://localhost:9"));
        assert_eq!(client.url("/status"), "http://localhost:9/status");
    }

    async fn call_blocking<F>(f: F) -> Result<RawResponse, String>
    where
        F: FnOnce() -> Result<RawResponse, String> + Send + 'static,
    {
        tokio::task::spawn_blocking(f).await.expect("join worker")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn status_success_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "output": "On branch main"
            })))
            .mount(&server)
            .await;

        let client = BackendClient::new(&BackendConfig::new(&server.uri()));
        let raw = call_blocking(move || client.status()).await;

        match classify(raw) {
            Outcome::Success(envelope) => {
                assert_eq!(envelope.output.as_deref(), Some("On branch main"));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn commit_posts_message_and_maps_domain_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/commit"))
            .and(body_json(json!({ "message": "fix parser" })))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "error": "Nothing to commit. Stage changes first."
            })))
            .mount(&server)
            .await;

        let client = BackendClient::new(&BackendConfig::new(&server.uri()));
        let raw = call_blocking(move || client.commit("fix parser")).await;

        match classify(raw) {
            Outcome::DomainError {
                message,
                git_unavailable,
            } => {
                assert_eq!(message, "Nothing to commit. Stage changes first.");
                assert!(!git_unavailable);
            }
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn plain_500_maps_to_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/push"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let client = BackendClient::new(&BackendConfig::new(&server.uri()));
        let raw = call_blocking(move || client.push()).await;

        match classify(raw) {
            Outcome::TransportError { message } => {
                assert!(message.starts_with("Server error (500):"));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_json_body_maps_to_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pull"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy page</html>"))
            .mount(&server)
            .await;

        let client = BackendClient::new(&BackendConfig::new(&server.uri()));
        let raw = call_blocking(move || client.pull()).await;

        assert!(matches!(classify(raw), Outcome::Malformed { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_backend_maps_to_transport_error() {
        // Nothing listens on port 1.
        let client = BackendClient::new(&BackendConfig::new("http://127.0.0.1:1"));
        let raw = call_blocking(move || client.status()).await;

        assert!(matches!(classify(raw), Outcome::TransportError { .. }));
    }
}
