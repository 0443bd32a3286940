//! Core domain types and traits for pipeset.
//!
//! This crate contains:
//! - Target names and auth tokens
//! - The `Client`, `Team`, `Authenticator` and `ClientFactory` traits
//! - The pipeline configuration model
//! - The API error type

pub mod auth;
pub mod client;
pub mod error;
pub mod name;
pub mod pipeline;

pub use auth::{Authenticator, Token};
pub use client::{Client, ClientFactory, ExistingConfig, SaveConfigOutcome, ServerInfo, Team};
pub use error::{Error, Result};
pub use name::TargetName;
pub use pipeline::{ConfigWarning, PipelineConfig};
