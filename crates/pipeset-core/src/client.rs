//! API client traits.
//!
//! A `Client` is bound to one server URL; a `Team` scopes pipeline operations
//! to one team on that server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::Result;
use crate::pipeline::{ConfigWarning, PipelineConfig};

/// Server information reported by `GET /api/v1/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: String,
    #[serde(default)]
    pub worker_version: String,
}

/// The pipeline config currently stored on the server.
#[derive(Debug, Clone, Default)]
pub struct ExistingConfig {
    /// Parsed config as returned by the server.
    pub config: PipelineConfig,
    /// The raw config text as it was submitted.
    pub raw_config: String,
    /// Opaque version token for optimistic concurrency.
    pub version: String,
}

/// Outcome of a create-or-update call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveConfigOutcome {
    pub created: bool,
    pub updated: bool,
    pub warnings: Vec<ConfigWarning>,
}

/// A client bound to one server.
#[async_trait]
pub trait Client: Send + Sync {
    /// Base URL of the server.
    fn url(&self) -> &str;

    /// The HTTP transport this client sends requests with.
    fn http_client(&self) -> &reqwest::Client;

    /// Fetch server version information.
    async fn get_info(&self) -> Result<ServerInfo>;

    /// Pipeline operations scoped to `team_name`.
    fn team(&self, team_name: &str) -> Box<dyn Team>;
}

/// Pipeline operations for a single team.
#[async_trait]
pub trait Team: Send + Sync {
    /// Name of the team.
    fn name(&self) -> &str;

    /// Fetch the stored config of `pipeline`, or `None` when no such pipeline
    /// exists. A stored config that carries errors yields
    /// `Error::PipelineConfig`.
    async fn pipeline_config(&self, pipeline: &str) -> Result<Option<ExistingConfig>>;

    /// Create or update `pipeline`. `config_version` must be the version token
    /// of the config being replaced; the server rejects stale versions.
    async fn create_or_update_pipeline_config(
        &self,
        pipeline: &str,
        config_version: Option<&str>,
        config: &[u8],
        check_credentials: bool,
    ) -> Result<SaveConfigOutcome>;

    /// Unpause `pipeline`. Returns `false` when the pipeline does not exist.
    async fn unpause_pipeline(&self, pipeline: &str) -> Result<bool>;
}

/// Constructs clients. Construction performs no I/O.
pub trait ClientFactory: Send + Sync {
    fn new_client(&self, url: &str, http_client: reqwest::Client, tracing: bool)
    -> Arc<dyn Client>;
}
