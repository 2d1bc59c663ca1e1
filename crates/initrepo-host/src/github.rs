use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use initrepo_core::config::web_base;
use initrepo_core::error::InitRepoError;
use initrepo_core::models::creation::{CreatedRepo, RepoCreation};

use crate::HostProvider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GitHubProvider {
    client: reqwest::Client,
    api_url: url::Url,
    web_base: String,
    username: String,
}

impl GitHubProvider {
    pub fn new(api_url: url::Url, token: String, username: String) -> Result<Self, InitRepoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            InitRepoError::Config {
                message: "github_token contains characters not allowed in a header".into(),
            }
        })?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(concat!("init_repo/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| InitRepoError::Config {
                message: format!("could not set up the HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            web_base: web_base(&api_url),
            api_url,
            username,
        })
    }

    fn url(&self, path: &str) -> String {
        let base = self.api_url.as_str().trim_end_matches('/');
        format!("{base}{path}")
    }
}

#[derive(Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    description: String,
    private: bool,
    auto_init: bool,
}

#[derive(Deserialize)]
struct GhRepo {
    full_name: String,
    html_url: String,
}

#[derive(Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Deserialize, Default)]
struct GhError {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<GhErrorDetail>,
}

#[derive(Deserialize)]
struct GhErrorDetail {
    message: Option<String>,
    code: Option<String>,
}

impl GhError {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn is_name_taken(&self) -> bool {
        let mentions = |m: &Option<String>| {
            m.as_deref()
                .is_some_and(|m| m.to_lowercase().contains("already exists"))
        };
        mentions(&self.message)
            || self
                .errors
                .iter()
                .any(|e| mentions(&e.message) || e.code.as_deref() == Some("already_exists"))
    }

    /// Provider message, with field-level details appended when present.
    fn describe(&self, body: &str) -> String {
        let mut msg = match &self.message {
            Some(m) => m.clone(),
            None if body.trim().is_empty() => "no response body".to_string(),
            None => body.trim().to_string(),
        };
        let details: Vec<&str> = self
            .errors
            .iter()
            .filter_map(|e| e.message.as_deref())
            .collect();
        if !details.is_empty() {
            msg = format!("{msg} ({})", details.join("; "));
        }
        msg
    }
}

fn transport_error(e: reqwest::Error) -> InitRepoError {
    let message = if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        e.to_string()
    };
    InitRepoError::Network { message }
}

/// Map a repository-creation response onto an outcome.
fn classify_create(
    status: StatusCode,
    body: &str,
    name: &str,
    username: &str,
    web_base: &str,
) -> Result<RepoCreation, InitRepoError> {
    let full_name = format!("{username}/{name}");

    if status.is_success() {
        let created = match serde_json::from_str::<GhRepo>(body) {
            Ok(repo) => CreatedRepo {
                full_name: repo.full_name,
                html_url: repo.html_url,
            },
            Err(e) => {
                tracing::debug!("unreadable creation response ({e}), deriving repo details");
                CreatedRepo {
                    html_url: format!("{web_base}/{full_name}"),
                    full_name,
                }
            }
        };
        return Ok(RepoCreation::Created(created));
    }

    let error = GhError::parse(body);
    match status {
        StatusCode::UNPROCESSABLE_ENTITY if error.is_name_taken() => {
            Ok(RepoCreation::AlreadyExists { full_name })
        }
        StatusCode::UNAUTHORIZED => Err(InitRepoError::AuthFailed {
            message: error.describe(body),
        }),
        other => Err(InitRepoError::Api {
            status: other.as_u16(),
            message: error.describe(body),
        }),
    }
}

#[async_trait]
impl HostProvider for GitHubProvider {
    async fn create_repository(&self, name: &str) -> Result<RepoCreation, InitRepoError> {
        let request = CreateRepoRequest {
            name,
            description: format!("Repository for {name}"),
            private: false,
            auto_init: false,
        };

        tracing::debug!("POST {}", self.url("/user/repos"));
        let resp = self
            .client
            .post(self.url("/user/repos"))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transport_error)?;
        tracing::debug!("create repository response {status}: {body}");

        classify_create(status, &body, name, &self.username, &self.web_base)
    }

    async fn authenticated_user(&self) -> Result<String, InitRepoError> {
        let resp = self
            .client
            .get(self.url("/user"))
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transport_error)?;

        if status.is_success() {
            let user: GhUser = serde_json::from_str(&body).map_err(|e| InitRepoError::Api {
                status: status.as_u16(),
                message: format!("JSON parse error: {e}"),
            })?;
            return Ok(user.login);
        }

        let error = GhError::parse(&body);
        if status == StatusCode::UNAUTHORIZED {
            return Err(InitRepoError::AuthFailed {
                message: error.describe(&body),
            });
        }
        Err(InitRepoError::Api {
            status: status.as_u16(),
            message: error.describe(&body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const GITHUB: &str = "https://github.com";

    const TAKEN_BODY: &str = r#"{
        "message": "Repository creation failed.",
        "errors": [{"resource": "Repository", "code": "custom", "field": "name",
                    "message": "name already exists on this account"}]
    }"#;

    #[test]
    fn test_classify_created() {
        let body = r#"{"full_name":"u/demo","html_url":"https://github.com/u/demo",
                      "ssh_url":"git@github.com:u/demo.git","private":false}"#;
        let outcome = classify_create(StatusCode::CREATED, body, "demo", "u", GITHUB).unwrap();
        assert_eq!(
            outcome,
            RepoCreation::Created(CreatedRepo {
                full_name: "u/demo".into(),
                html_url: "https://github.com/u/demo".into(),
            })
        );
    }

    #[test]
    fn test_classify_created_with_unreadable_body() {
        let outcome = classify_create(StatusCode::CREATED, "", "demo", "u", GITHUB).unwrap();
        assert_eq!(outcome.full_name(), "u/demo");
        assert!(outcome.is_new());
    }

    #[test]
    fn test_classify_unreadable_body_uses_enterprise_host() {
        let outcome =
            classify_create(StatusCode::CREATED, "{}", "demo", "u", "https://ghe.example.com").unwrap();
        match outcome {
            RepoCreation::Created(repo) => {
                assert_eq!(repo.html_url, "https://ghe.example.com/u/demo")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_classify_name_taken() {
        let outcome =
            classify_create(StatusCode::UNPROCESSABLE_ENTITY, TAKEN_BODY, "demo", "u", GITHUB).unwrap();
        assert_eq!(
            outcome,
            RepoCreation::AlreadyExists {
                full_name: "u/demo".into()
            }
        );
    }

    #[test]
    fn test_classify_other_validation_failure() {
        let body = r#"{"message":"Validation Failed","errors":[{"code":"invalid","message":"name is too long"}]}"#;
        match classify_create(StatusCode::UNPROCESSABLE_ENTITY, body, "demo", "u", GITHUB).unwrap_err() {
            InitRepoError::Api { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Validation Failed (name is too long)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_unauthorized() {
        let body = r#"{"message":"Bad credentials"}"#;
        match classify_create(StatusCode::UNAUTHORIZED, body, "demo", "u", GITHUB).unwrap_err() {
            InitRepoError::AuthFailed { message } => assert_eq!(message, "Bad credentials"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_non_json_error_keeps_body() {
        match classify_create(StatusCode::BAD_GATEWAY, "upstream down", "demo", "u", GITHUB).unwrap_err() {
            InitRepoError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (url::Url, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            // Headers, then as much body as Content-Length announces.
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let content_length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        let url = url::Url::parse(&format!("http://{addr}")).unwrap();
        (url, handle)
    }

    #[tokio::test]
    async fn test_create_repository_sends_authenticated_post() {
        let (url, server) = serve_once(
            "201 Created",
            r#"{"full_name":"u/demo","html_url":"https://github.com/u/demo","ssh_url":"git@github.com:u/demo.git"}"#,
        )
        .await;

        let provider = GitHubProvider::new(url, "t0k3n".into(), "u".into()).unwrap();
        let outcome = provider.create_repository("demo").await.unwrap();
        assert!(outcome.is_new());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /user/repos HTTP/1.1"));
        assert!(request.to_lowercase().contains("authorization: bearer t0k3n"));
        assert!(request.contains(r#""name":"demo""#));
        assert!(request.contains(r#""description":"Repository for demo""#));
        assert!(request.contains(r#""auto_init":false"#));
    }

    #[tokio::test]
    async fn test_create_repository_already_exists() {
        let (url, server) = serve_once("422 Unprocessable Entity", TAKEN_BODY).await;
        let provider = GitHubProvider::new(url, "t".into(), "u".into()).unwrap();

        let outcome = provider.create_repository("demo").await.unwrap();
        assert!(!outcome.is_new());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_authenticated_user() {
        let (url, server) = serve_once("200 OK", r#"{"login":"u","id":1}"#).await;
        let provider = GitHubProvider::new(url, "t".into(), "u".into()).unwrap();

        assert_eq!(provider.authenticated_user().await.unwrap(), "u");
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /user HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_authenticated_user_bad_credentials() {
        let (url, server) = serve_once("401 Unauthorized", r#"{"message":"Bad credentials"}"#).await;
        let provider = GitHubProvider::new(url, "t".into(), "u".into()).unwrap();

        let err = provider.authenticated_user().await.unwrap_err();
        assert!(matches!(err, InitRepoError::AuthFailed { .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Bind then drop so the port is very likely closed.
        let addr = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap();
        let url = url::Url::parse(&format!("http://{addr}")).unwrap();
        let provider = GitHubProvider::new(url, "t".into(), "u".into()).unwrap();

        let err = provider.create_repository("demo").await.unwrap_err();
        assert!(matches!(err, InitRepoError::Network { .. }));
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        let url = url::Url::parse("https://api.github.com").unwrap();
        let result = GitHubProvider::new(url, "bad\ntoken".into(), "u".into());
        assert!(result.is_err());
    }
}
