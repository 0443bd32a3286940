//! HTTP client, targets and pipeline operations for pipeset.
//!
//! Provides:
//! - A reqwest-backed `Client`/`Team` for the CI server's REST API
//! - The OAuth2 password-grant authenticator
//! - `Target`, an authenticated client plus version checks
//! - `set_pipeline` and `unpause_pipeline`

pub mod auth;
pub mod concourse;
pub mod pipeline;
pub mod target;
pub mod tls;
pub mod version;

#[cfg(test)]
mod testing;

pub use auth::OAuth2Authenticator;
pub use concourse::{ConcourseClient, ConcourseClientFactory, ConcourseTeam};
pub use pipeline::{PipelineError, set_pipeline, unpause_pipeline};
pub use target::{Target, TargetSpec};
pub use tls::TlsConfig;
pub use version::CLIENT_VERSION;

pub use pipeset_core::{
    Authenticator, Client, ClientFactory, Error, ExistingConfig, Result, SaveConfigOutcome,
    ServerInfo, Team, Token,
};
