//! Resolving raw pipeline configs.
//!
//! Resolution runs in a fixed order:
//! 1. strict mode parses the raw bytes as a plain mapping first, so duplicate
//!    keys are caught before templating can hide them
//! 2. variable files are read
//! 3. legacy `{{name}}` markers are substituted, if any
//! 4. `((name))` references are substituted
//!
//! The two template passes use different precedence. The legacy pass merges
//! files in listed order and lets flags override them. The `((name))` pass
//! looks at flags first, then at the files from last to first.

use pipeset_core::{ConfigWarning, PipelineConfig};
use tracing::debug;

use crate::variables::{TemplateVariables, Variables, parse_variables};
use crate::{ConfigError, ConfigResult, legacy, template, validation};

/// Resolve all template references in `raw`.
pub fn resolve_config(
    raw: &[u8],
    vars: &TemplateVariables,
    allow_empty: bool,
    strict: bool,
) -> ConfigResult<Vec<u8>> {
    if strict && !is_blank(raw) {
        let mapping: serde_yaml::Mapping =
            serde_yaml::from_slice(raw).map_err(ConfigError::PreTemplateParse)?;
        serde_yaml::Value::Mapping(mapping)
            .apply_merge()
            .map_err(ConfigError::PreTemplateParse)?;
    }

    let payloads = vars.load_files()?;
    let mut resolved = raw.to_vec();

    if legacy::is_present(&resolved) {
        debug!("resolving legacy template markers");
        resolved = resolve_legacy(&resolved, &payloads, vars, allow_empty)
            .map_err(ConfigError::LegacyTemplate)?;
    }

    resolve_templates(&resolved, &payloads, vars).map_err(ConfigError::Template)
}

fn resolve_legacy(
    content: &[u8],
    payloads: &[Vec<u8>],
    vars: &TemplateVariables,
    allow_empty: bool,
) -> Result<Vec<u8>, crate::TemplateError> {
    let mut sources = payloads
        .iter()
        .map(|payload| parse_variables(payload).and_then(legacy::stringify))
        .collect::<Result<Vec<_>, _>>()?;
    sources.push(vars.string_variables());

    legacy::evaluate(content, &legacy::merge(&sources), allow_empty)
}

fn resolve_templates(
    content: &[u8],
    payloads: &[Vec<u8>],
    vars: &TemplateVariables,
) -> Result<Vec<u8>, crate::TemplateError> {
    let mut tiers: Vec<Variables> = vec![vars.flag_variables()];
    for payload in payloads.iter().rev() {
        tiers.push(parse_variables(payload)?);
    }

    template::evaluate(content, &tiers)
}

/// Parse resolved bytes into a `PipelineConfig`.
///
/// Blank input yields an empty config. `<<` merge keys are applied before
/// the config is decoded. In strict mode any key the config model does not
/// recognise is an error.
pub fn parse_config(resolved: &[u8], strict: bool) -> ConfigResult<PipelineConfig> {
    if is_blank(resolved) {
        return Ok(PipelineConfig::default());
    }

    let mut document: serde_yaml::Value = serde_yaml::from_slice(resolved)?;
    document.apply_merge()?;
    let config: PipelineConfig = serde_yaml::from_value(document)?;

    if strict {
        let unknown = validation::unknown_fields(&config);
        if !unknown.is_empty() {
            return Err(ConfigError::UnknownFields(unknown));
        }
    }

    Ok(config)
}

/// Resolve `raw` for submission: unbound legacy variables are an error, and
/// the result must parse as a pipeline config.
pub fn evaluate_config(raw: &[u8], vars: &TemplateVariables) -> ConfigResult<Vec<u8>> {
    let resolved = resolve_config(raw, vars, false, false)?;
    parse_config(&resolved, false)?;
    Ok(resolved)
}

/// Resolve and validate `raw` without submitting it.
///
/// Validation errors are fatal. In strict mode warnings are fatal too.
pub fn validate_config(
    raw: &[u8],
    vars: &TemplateVariables,
    strict: bool,
) -> ConfigResult<Vec<ConfigWarning>> {
    let resolved = resolve_config(raw, vars, true, strict)?;
    let config = parse_config(&resolved, strict)?;

    let (warnings, errors) = validation::validate(&config);
    if !errors.is_empty() || (strict && !warnings.is_empty()) {
        return Err(ConfigError::BadConfig { warnings, errors });
    }

    Ok(warnings)
}

fn is_blank(content: &[u8]) -> bool {
    content.iter().all(u8::is_ascii_whitespace)
}
