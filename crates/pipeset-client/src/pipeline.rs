//! Setting and unpausing pipelines.

use pipeset_config::{ConfigError, TemplateVariables, evaluate_config};
use pipeset_core::{Error, SaveConfigOutcome};
use tracing::{info, warn};

use crate::Target;

/// Errors from pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Api(#[from] Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Resolve `raw_config` and create or update pipeline `name` on `target`.
///
/// The stored config version is fetched first and sent back with the update.
/// A pipeline that does not exist yet, or whose stored config is broken, is
/// saved without a version.
pub async fn set_pipeline(
    target: &Target,
    name: &str,
    raw_config: &[u8],
    vars: &TemplateVariables,
    check_credentials: bool,
) -> Result<SaveConfigOutcome, PipelineError> {
    let team = target.team();

    let version = match team.pipeline_config(name).await {
        Ok(Some(existing)) => Some(existing.version),
        Ok(None) => None,
        Err(Error::PipelineConfig { errors }) => {
            warn!(pipeline = name, ?errors, "stored pipeline config has errors");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let config = evaluate_config(raw_config, vars)?;

    let outcome = team
        .create_or_update_pipeline_config(name, version.as_deref(), &config, check_credentials)
        .await?;

    for warning in &outcome.warnings {
        warn!(pipeline = name, "{}", warning);
    }

    if outcome.created {
        info!(pipeline = name, team = team.name(), "pipeline created");
    } else {
        info!(pipeline = name, team = team.name(), "pipeline updated");
    }

    Ok(outcome)
}

/// Unpause pipeline `name`. Returns `false` when it does not exist.
pub async fn unpause_pipeline(target: &Target, name: &str) -> Result<bool, Error> {
    let found = target.team().unpause_pipeline(name).await?;
    if found {
        info!(pipeline = name, "unpaused");
    }
    Ok(found)
}
