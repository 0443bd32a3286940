//! Targets: an authenticated client for one team on one server.

use pipeset_core::{
    Authenticator, Client, ClientFactory, Error, Result, ServerInfo, TargetName, Team, Token,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::tls::{self, TlsConfig};
use crate::version::{self, CLIENT_VERSION};

/// Everything needed to log in to a target.
#[derive(Debug, Clone)]
pub struct TargetSpec {
    pub name: TargetName,
    pub url: String,
    pub team: String,
    pub username: String,
    pub password: String,
    /// PEM encoded CA certificate; empty for none.
    pub ca_cert: String,
    pub insecure: bool,
    pub tracing: bool,
}

/// A logged-in target.
///
/// The token is obtained once at construction and never refreshed. Server
/// info is fetched on first use and cached for the lifetime of the target.
pub struct Target {
    name: TargetName,
    team_name: String,
    url: String,
    ca_cert: String,
    tls_config: TlsConfig,
    token: Option<Token>,
    client: Arc<dyn Client>,
    info: OnceCell<ServerInfo>,
}

impl Target {
    pub fn new(
        name: TargetName,
        team_name: impl Into<String>,
        url: impl Into<String>,
        tls_config: TlsConfig,
        token: Option<Token>,
        client: Arc<dyn Client>,
    ) -> Self {
        Self {
            name,
            team_name: team_name.into(),
            url: url.into(),
            ca_cert: String::new(),
            tls_config,
            token,
            client,
            info: OnceCell::new(),
        }
    }

    fn with_ca_cert(mut self, ca_cert: impl Into<String>) -> Self {
        self.ca_cert = ca_cert.into();
        self
    }

    /// Log in with a password grant and build a target whose client sends
    /// the resulting token on every request.
    pub async fn authenticated(
        spec: &TargetSpec,
        factory: &dyn ClientFactory,
        authenticator: &dyn Authenticator,
    ) -> Result<Self> {
        let ca_cert = tls::load_ca_cert(&spec.ca_cert)?;
        let tls_config = TlsConfig::new(spec.insecure, ca_cert);

        let unauthenticated = factory.new_client(
            &spec.url,
            tls::transport(&tls_config, None)?,
            spec.tracing,
        );

        debug!(target_name = %spec.name, url = %spec.url, "authenticating");
        let token = authenticator
            .get_token(unauthenticated.as_ref(), &spec.username, &spec.password)
            .await
            .map_err(|e| match e {
                Error::Authentication(_) => e,
                other => Error::Authentication(other.to_string()),
            })?;

        let client = factory.new_client(
            &spec.url,
            tls::transport(&tls_config, Some(&token))?,
            spec.tracing,
        );

        Ok(Self::new(
            spec.name.clone(),
            spec.team.clone(),
            spec.url.clone(),
            tls_config,
            Some(token),
            client,
        )
        .with_ca_cert(spec.ca_cert.clone()))
    }

    pub fn name(&self) -> &TargetName {
        &self.name
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn ca_cert(&self) -> &str {
        &self.ca_cert
    }

    pub fn tls_config(&self) -> &TlsConfig {
        &self.tls_config
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn client(&self) -> &Arc<dyn Client> {
        &self.client
    }

    /// Pipeline operations for this target's team.
    pub fn team(&self) -> Box<dyn Team> {
        self.client.team(&self.team_name)
    }

    async fn info(&self) -> Result<&ServerInfo> {
        self.info.get_or_try_init(|| self.client.get_info()).await
    }

    /// Server version.
    pub async fn version(&self) -> Result<String> {
        Ok(self.info().await?.version.clone())
    }

    /// Worker version the server expects; empty when it reports none.
    pub async fn worker_version(&self) -> Result<String> {
        Ok(self.info().await?.worker_version.clone())
    }

    /// The `Authorization` header value, if this target holds a token.
    pub fn token_authorization(&self) -> Option<String> {
        match &self.token {
            Some(token) if !token.is_empty() => Some(token.header_value()),
            _ => None,
        }
    }

    /// Check that the server runs a compatible version. Patch releases may
    /// differ; major and minor must match.
    pub async fn validate(&self) -> Result<()> {
        let server_version = self.version().await?;
        if server_version == CLIENT_VERSION {
            return Ok(());
        }

        let client = version::parse(CLIENT_VERSION)?;
        let server = version::parse(&server_version)?;

        if client.major != server.major || client.minor != server.minor {
            return Err(Error::VersionMismatch {
                client: CLIENT_VERSION.to_string(),
                server: server_version,
                target: self.name.clone(),
            });
        }

        Ok(())
    }

    /// Like `validate`, but only logs a warning on mismatch.
    pub async fn validate_with_warning_only(&self) -> Result<()> {
        if let Err(err) = self.validate().await {
            warn!(target_name = %self.name, "{}", err);
        }
        Ok(())
    }

    /// Whether a worker at `worker_version` may register with this server.
    pub async fn is_worker_version_compatible(&self, worker_version: &str) -> Result<bool> {
        let expected = self.worker_version().await?;
        if expected.is_empty() {
            return Ok(true);
        }
        if worker_version.is_empty() {
            return Ok(false);
        }

        let worker = version::parse_lenient(worker_version)?;
        let server = version::parse_lenient(&expected)?;

        if worker.major != server.major {
            return Ok(false);
        }

        Ok(worker.minor >= server.minor)
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("team_name", &self.team_name)
            .field("url", &self.url)
            .field("tls_config", &self.tls_config)
            .field("token", &self.token.as_ref().map(|t| t.token_type.as_str()))
            .finish()
    }
}
