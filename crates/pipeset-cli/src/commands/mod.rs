//! CLI command implementations.

use anyhow::{Context, Result, bail};
use pipeset_client::{
    ConcourseClientFactory, OAuth2Authenticator, Target, TargetSpec, set_pipeline,
    unpause_pipeline,
};
use pipeset_config::{ConfigError, TemplateVariables, validate_config};
use pipeset_core::ConfigWarning;
use std::path::Path;
use tracing::info;

pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))
}

fn read_config(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("could not read config {}", path.display()))
}

/// Log in, set `pipeline` from the config at `config_path`, then unpause it.
pub async fn apply(
    spec: &TargetSpec,
    pipeline: &str,
    config_path: &Path,
    vars: &TemplateVariables,
    check_creds: bool,
) -> Result<()> {
    let target = Target::authenticated(spec, &ConcourseClientFactory, &OAuth2Authenticator::new())
        .await
        .context("could not init target")?;
    target.validate_with_warning_only().await?;

    let raw = read_config(config_path)?;

    let outcome = set_pipeline(&target, pipeline, &raw, vars, check_creds)
        .await
        .context("could not set pipeline")?;
    print_warnings(&outcome.warnings);

    let found = unpause_pipeline(&target, pipeline)
        .await
        .context("failed to unpause pipeline")?;
    if !found {
        bail!("failed to unpause pipeline: pipeline '{}' not found", pipeline);
    }

    info!(
        target_name = %target.name(),
        team = target.team_name(),
        pipeline,
        "pipeline set and unpaused"
    );
    Ok(())
}

/// Resolve and validate the config at `config_path` without contacting a
/// server.
pub fn validate(config_path: &Path, vars: &TemplateVariables, strict: bool) -> Result<()> {
    let raw = read_config(config_path)?;

    match validate_config(&raw, vars, strict) {
        Ok(warnings) => {
            print_warnings(&warnings);
            println!("looks good");
            Ok(())
        }
        Err(ConfigError::BadConfig { warnings, errors }) => {
            print_warnings(&warnings);
            if !errors.is_empty() {
                eprintln!("ERRORS:");
                for error in &errors {
                    eprintln!("  - {}", error);
                }
            }
            bail!("configuration invalid");
        }
        Err(e) => Err(e).context("configuration invalid"),
    }
}

fn print_warnings(warnings: &[ConfigWarning]) {
    if warnings.is_empty() {
        return;
    }

    eprintln!("WARNINGS:");
    for warning in warnings {
        eprintln!("  - {}", warning.message);
    }
}
