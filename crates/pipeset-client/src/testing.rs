//! In-memory `Client`, `Team`, `Authenticator` and `ClientFactory` for tests.

use async_trait::async_trait;
use pipeset_core::{
    Authenticator, Client, ClientFactory, ConfigWarning, Error, ExistingConfig, Result,
    SaveConfigOutcome, ServerInfo, Team, Token,
};
use std::sync::{Arc, Mutex};

/// A create-or-update call seen by `MockTeam`.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedConfig {
    pub team: String,
    pub pipeline: String,
    pub version: Option<String>,
    pub config: Vec<u8>,
    pub check_credentials: bool,
}

/// Server state shared by every mock client built from the same factory.
#[derive(Debug, Default)]
pub struct MockState {
    pub info: ServerInfo,
    pub info_calls: usize,
    pub existing: Option<ExistingConfig>,
    pub fetch_error: Option<Error>,
    pub save_error: Option<Error>,
    pub save_warnings: Vec<ConfigWarning>,
    pub saved: Vec<SavedConfig>,
    pub unpaused: Vec<String>,
    pub unpause_found: bool,
}

pub type SharedState = Arc<Mutex<MockState>>;

pub fn state_with_version(version: &str, worker_version: &str) -> SharedState {
    Arc::new(Mutex::new(MockState {
        info: ServerInfo {
            version: version.to_string(),
            worker_version: worker_version.to_string(),
        },
        unpause_found: true,
        ..Default::default()
    }))
}

pub struct MockClient {
    url: String,
    http: reqwest::Client,
    state: SharedState,
}

impl MockClient {
    pub fn new(url: &str, state: SharedState) -> Self {
        Self {
            url: url.to_string(),
            http: reqwest::Client::new(),
            state,
        }
    }
}

#[async_trait]
impl Client for MockClient {
    fn url(&self) -> &str {
        &self.url
    }

    fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    async fn get_info(&self) -> Result<ServerInfo> {
        let mut state = self.state.lock().unwrap();
        state.info_calls += 1;
        Ok(state.info.clone())
    }

    fn team(&self, team_name: &str) -> Box<dyn Team> {
        Box::new(MockTeam {
            name: team_name.to_string(),
            state: self.state.clone(),
        })
    }
}

pub struct MockTeam {
    name: String,
    state: SharedState,
}

#[async_trait]
impl Team for MockTeam {
    fn name(&self) -> &str {
        &self.name
    }

    async fn pipeline_config(&self, _pipeline: &str) -> Result<Option<ExistingConfig>> {
        let mut state = self.state.lock().unwrap();
        match state.fetch_error.take() {
            Some(err) => Err(err),
            None => Ok(state.existing.clone()),
        }
    }

    async fn create_or_update_pipeline_config(
        &self,
        pipeline: &str,
        config_version: Option<&str>,
        config: &[u8],
        check_credentials: bool,
    ) -> Result<SaveConfigOutcome> {
        let mut state = self.state.lock().unwrap();
        state.saved.push(SavedConfig {
            team: self.name.clone(),
            pipeline: pipeline.to_string(),
            version: config_version.map(str::to_string),
            config: config.to_vec(),
            check_credentials,
        });

        if let Some(err) = state.save_error.take() {
            return Err(err);
        }

        let exists = state.existing.is_some();
        Ok(SaveConfigOutcome {
            created: !exists,
            updated: exists,
            warnings: state.save_warnings.clone(),
        })
    }

    async fn unpause_pipeline(&self, pipeline: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.unpaused.push(pipeline.to_string());
        Ok(state.unpause_found)
    }
}

/// Returns a fixed token, or fails when none is set.
pub struct MockAuthenticator {
    pub token: Option<Token>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl MockAuthenticator {
    pub fn new(token: Option<Token>) -> Self {
        Self {
            token,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn get_token(
        &self,
        _client: &dyn Client,
        username: &str,
        password: &str,
    ) -> Result<Token> {
        self.calls
            .lock()
            .unwrap()
            .push((username.to_string(), password.to_string()));

        self.token
            .clone()
            .ok_or_else(|| Error::Transport("connection refused".to_string()))
    }
}

pub struct MockClientFactory {
    pub state: SharedState,
    pub urls: Mutex<Vec<String>>,
}

impl MockClientFactory {
    pub fn new(state: SharedState) -> Self {
        Self {
            state,
            urls: Mutex::new(Vec::new()),
        }
    }
}

impl ClientFactory for MockClientFactory {
    fn new_client(
        &self,
        url: &str,
        _http_client: reqwest::Client,
        _tracing: bool,
    ) -> Arc<dyn Client> {
        self.urls.lock().unwrap().push(url.to_string());
        Arc::new(MockClient::new(url, self.state.clone()))
    }
}
