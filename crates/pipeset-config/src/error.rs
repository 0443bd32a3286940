//! Configuration errors.

use pipeset_core::ConfigWarning;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error parsing yaml before applying templates: {0}")]
    PreTemplateParse(#[source] serde_yaml::Error),

    #[error("could not read template variables file ({path}): {source}")]
    VarsFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not resolve old-style template vars: {0}")]
    LegacyTemplate(#[source] TemplateError),

    #[error("could not resolve template vars: {0}")]
    Template(#[source] TemplateError),

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("unknown fields: {}", .0.join(", "))]
    UnknownFields(Vec<String>),

    #[error("Bad configuration")]
    BadConfig {
        warnings: Vec<ConfigWarning>,
        errors: Vec<String>,
    },

    #[error("invalid variable '{0}': expected name=value")]
    InvalidVariable(String),
}

/// Errors raised by either template engine.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unbound variable in template: '{0}'")]
    UnboundVariable(String),

    #[error("invalid variables payload: {0}")]
    Variables(#[source] serde_yaml::Error),

    #[error("could not parse template: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("could not render template: {0}")]
    Render(#[source] serde_yaml::Error),

    #[error("could not render value of '{name}': {source}")]
    Value {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot interpolate non-scalar value of '{0}' into a string")]
    NonScalar(String),

    #[error("expected to find key '{key}' in variable '{name}'")]
    MissingKey { name: String, key: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
