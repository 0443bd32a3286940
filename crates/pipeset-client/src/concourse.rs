//! reqwest-backed implementation of the API client traits.

use async_trait::async_trait;
use pipeset_core::{
    Client, ClientFactory, ConfigWarning, Error, ExistingConfig, PipelineConfig, Result,
    SaveConfigOutcome, ServerInfo, Team,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Header carrying the optimistic-concurrency version of a pipeline config.
pub const CONFIG_VERSION_HEADER: &str = "X-Concourse-Config-Version";

#[derive(Debug, Clone)]
struct Connection {
    http: reqwest::Client,
    url: String,
    tracing: bool,
}

impl Connection {
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.url, path))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build()?;
        if self.tracing {
            info!(method = %request.method(), url = %request.url(), "request");
        }

        let response = self.http.execute(request).await?;
        if self.tracing {
            info!(status = %response.status(), url = %response.url(), "response");
        }

        Ok(response)
    }
}

async fn unexpected(response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Error::UnexpectedResponse { status, body }
}

async fn forbidden(response: Response) -> Error {
    Error::Forbidden(response.text().await.unwrap_or_default())
}

/// Client for a single server.
#[derive(Debug, Clone)]
pub struct ConcourseClient {
    conn: Connection,
}

impl ConcourseClient {
    pub fn new(url: &str, http: reqwest::Client, tracing: bool) -> Self {
        Self {
            conn: Connection {
                http,
                url: url.trim_end_matches('/').to_string(),
                tracing,
            },
        }
    }
}

#[async_trait]
impl Client for ConcourseClient {
    fn url(&self) -> &str {
        &self.conn.url
    }

    fn http_client(&self) -> &reqwest::Client {
        &self.conn.http
    }

    async fn get_info(&self) -> Result<ServerInfo> {
        let response = self
            .conn
            .send(self.conn.request(Method::GET, "/api/v1/info"))
            .await?;

        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }

        Ok(response.json().await?)
    }

    fn team(&self, team_name: &str) -> Box<dyn Team> {
        Box::new(ConcourseTeam {
            name: team_name.to_string(),
            conn: self.conn.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ConfigResponse {
    #[serde(default)]
    config: Option<PipelineConfig>,
    #[serde(default)]
    raw_config: String,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SaveConfigResponse {
    #[serde(default)]
    warnings: Vec<ConfigWarning>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorsResponse {
    #[serde(default)]
    errors: Vec<String>,
}

/// Pipeline operations for one team.
#[derive(Debug, Clone)]
pub struct ConcourseTeam {
    name: String,
    conn: Connection,
}

impl ConcourseTeam {
    fn pipeline_path(&self, pipeline: &str) -> String {
        format!(
            "/api/v1/teams/{}/pipelines/{}",
            urlencoding::encode(&self.name),
            urlencoding::encode(pipeline)
        )
    }
}

#[async_trait]
impl Team for ConcourseTeam {
    fn name(&self) -> &str {
        &self.name
    }

    async fn pipeline_config(&self, pipeline: &str) -> Result<Option<ExistingConfig>> {
        let path = format!("{}/config", self.pipeline_path(pipeline));
        let response = self.conn.send(self.conn.request(Method::GET, &path)).await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::FORBIDDEN => return Err(forbidden(response).await),
            _ => return Err(unexpected(response).await),
        }

        let version = response
            .headers()
            .get(CONFIG_VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body: ConfigResponse = response.json().await?;
        if !body.errors.is_empty() {
            return Err(Error::PipelineConfig {
                errors: body.errors,
            });
        }

        Ok(Some(ExistingConfig {
            config: body.config.unwrap_or_default(),
            raw_config: body.raw_config,
            version,
        }))
    }

    async fn create_or_update_pipeline_config(
        &self,
        pipeline: &str,
        config_version: Option<&str>,
        config: &[u8],
        check_credentials: bool,
    ) -> Result<SaveConfigOutcome> {
        let path = format!("{}/config", self.pipeline_path(pipeline));
        let mut request = self
            .conn
            .request(Method::PUT, &path)
            .header(CONTENT_TYPE, "application/x-yaml")
            .body(config.to_vec());

        if let Some(version) = config_version.filter(|v| !v.is_empty()) {
            request = request.header(CONFIG_VERSION_HEADER, version);
        }
        if check_credentials {
            request = request.query(&[("check_creds", "")]);
        }

        let response = self.conn.send(request).await?;
        let (created, updated) = match response.status() {
            StatusCode::CREATED => (true, false),
            StatusCode::OK => (false, true),
            StatusCode::BAD_REQUEST => {
                let body: ErrorsResponse = response.json().await.unwrap_or_default();
                return Err(Error::InvalidConfig {
                    errors: body.errors,
                });
            }
            StatusCode::FORBIDDEN => return Err(forbidden(response).await),
            _ => return Err(unexpected(response).await),
        };

        let text = response.text().await?;
        let body: SaveConfigResponse = serde_json::from_str(&text).unwrap_or_default();

        Ok(SaveConfigOutcome {
            created,
            updated,
            warnings: body.warnings,
        })
    }

    async fn unpause_pipeline(&self, pipeline: &str) -> Result<bool> {
        let path = format!("{}/unpause", self.pipeline_path(pipeline));
        let response = self.conn.send(self.conn.request(Method::PUT, &path)).await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            StatusCode::FORBIDDEN => Err(forbidden(response).await),
            _ => Err(unexpected(response).await),
        }
    }
}

/// Builds `ConcourseClient`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcourseClientFactory;

impl ClientFactory for ConcourseClientFactory {
    fn new_client(
        &self,
        url: &str,
        http_client: reqwest::Client,
        tracing: bool,
    ) -> Arc<dyn Client> {
        Arc::new(ConcourseClient::new(url, http_client, tracing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn team(server: &MockServer) -> Box<dyn Team> {
        ConcourseClientFactory
            .new_client(&server.uri(), reqwest::Client::new(), true)
            .team("main")
    }

    #[tokio::test]
    async fn test_get_info() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "version": "4.2.5",
                "worker_version": "2.1",
                "external_url": "http://ci.example.com"
            })))
            .mount(&server)
            .await;

        let client = ConcourseClient::new(&server.uri(), reqwest::Client::new(), false);
        let info = client.get_info().await.unwrap();
        assert_eq!(info.version, "4.2.5");
        assert_eq!(info.worker_version, "2.1");
    }

    #[tokio::test]
    async fn test_get_info_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/info"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ConcourseClient::new(&server.uri(), reqwest::Client::new(), false);
        let err = client.get_info().await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_pipeline_config() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/teams/main/pipelines/hello-world/config"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(CONFIG_VERSION_HEADER, "42")
                    .set_body_json(json!({
                        "config": {"jobs": [{"name": "build", "plan": [{"get": "repo"}]}]},
                        "raw_config": "jobs: []"
                    })),
            )
            .mount(&server)
            .await;

        let existing = team(&server)
            .pipeline_config("hello-world")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(existing.version, "42");
        assert_eq!(existing.raw_config, "jobs: []");
        assert_eq!(existing.config.jobs[0].name, "build");
    }

    #[tokio::test]
    async fn test_pipeline_config_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/teams/main/pipelines/missing/config"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let existing = team(&server).pipeline_config("missing").await.unwrap();
        assert!(existing.is_none());
    }

    #[tokio::test]
    async fn test_pipeline_config_with_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/teams/main/pipelines/broken/config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": ["malformed config"]
            })))
            .mount(&server)
            .await;

        let err = team(&server).pipeline_config("broken").await.unwrap_err();
        match err {
            Error::PipelineConfig { errors } => assert_eq!(errors, vec!["malformed config"]),
            other => panic!("expected PipelineConfig, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pipeline_name_is_escaped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/teams/main/pipelines/with%20space/config"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let existing = team(&server).pipeline_config("with space").await.unwrap();
        assert!(existing.is_none());
    }

    #[tokio::test]
    async fn test_create_pipeline() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/teams/main/pipelines/hello-world/config"))
            .and(header("content-type", "application/x-yaml"))
            .and(body_string("jobs: []\n"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "warnings": [{"type": "pipeline", "message": "no jobs"}]
            })))
            .mount(&server)
            .await;

        let outcome = team(&server)
            .create_or_update_pipeline_config("hello-world", None, b"jobs: []\n", false)
            .await
            .unwrap();

        assert!(outcome.created);
        assert!(!outcome.updated);
        assert_eq!(outcome.warnings, vec![ConfigWarning::new("pipeline", "no jobs")]);
    }

    #[tokio::test]
    async fn test_update_pipeline_sends_version() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/teams/main/pipelines/hello-world/config"))
            .and(header(CONFIG_VERSION_HEADER, "7"))
            .and(query_param("check_creds", ""))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = team(&server)
            .create_or_update_pipeline_config("hello-world", Some("7"), b"jobs: []", true)
            .await
            .unwrap();

        assert!(outcome.updated);
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/teams/main/pipelines/hello-world/config"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": ["jobs[0] has no name"]
            })))
            .mount(&server)
            .await;

        let err = team(&server)
            .create_or_update_pipeline_config("hello-world", None, b"jobs: [{}]", false)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid configuration: jobs[0] has no name"
        );
    }

    #[tokio::test]
    async fn test_save_forbidden_and_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/teams/main/pipelines/locked/config"))
            .respond_with(ResponseTemplate::new(403).set_body_string("not authorized"))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/teams/main/pipelines/flaky/config"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let team = team(&server);
        let err = team
            .create_or_update_pipeline_config("locked", None, b"", false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let err = team
            .create_or_update_pipeline_config("flaky", None, b"", false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_unpause_pipeline() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/teams/main/pipelines/hello-world/unpause"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/teams/main/pipelines/missing/unpause"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let team = team(&server);
        assert!(team.unpause_pipeline("hello-world").await.unwrap());
        assert!(!team.unpause_pipeline("missing").await.unwrap());
    }
}
