//! Pipeline config templating and validation for pipeset.
//!
//! This crate handles:
//! - Variable sources (inline flags, inline YAML flags, variable files)
//! - Legacy `{{name}}` template evaluation
//! - `((name))` template evaluation
//! - Resolving, parsing and validating pipeline configs

pub mod error;
pub mod legacy;
pub mod resolve;
pub mod template;
pub mod validation;
pub mod variables;

pub use error::{ConfigError, ConfigResult, TemplateError};
pub use resolve::{evaluate_config, parse_config, resolve_config, validate_config};
pub use variables::{TemplateVariables, VariablePair, Variables, YamlVariablePair};
