//! pipeset: log in to a CI server, set a pipeline from a templated config and
//! unpause it.

use clap::{ArgAction, Args, Parser, Subcommand};
use pipeset_client::TargetSpec;
use pipeset_config::{TemplateVariables, VariablePair, YamlVariablePair};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;
use url::Url;

mod commands;

const DEFAULT_URL: &str = "http://concourse:8080";
const DEFAULT_TARGET: &str = "ricardo";
const DEFAULT_TEAM: &str = "main";
const DEFAULT_USERNAME: &str = "test";
const DEFAULT_PASSWORD: &str = "test";
const DEFAULT_PIPELINE: &str = "hello-world";
const DEFAULT_CONFIG: &str = "./pipeline.yml";
const DEFAULT_VAR: &str = "name=c6";

#[derive(Parser, Debug)]
#[command(name = "pipeset")]
#[command(about = "Set and unpause a CI pipeline", long_about = None)]
struct Cli {
    #[command(flatten)]
    target: TargetArgs,

    #[command(flatten)]
    pipeline: PipelineArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Log in, set the pipeline and unpause it (default)
    Apply,
    /// Resolve and validate the pipeline config locally
    Validate,
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Server URL
    #[arg(long, env = "PIPESET_URL", default_value = DEFAULT_URL, global = true)]
    url: Url,

    /// Local name of the target, used in messages
    #[arg(short, long, env = "PIPESET_TARGET", default_value = DEFAULT_TARGET, global = true)]
    target: String,

    /// Team to operate on
    #[arg(short = 'n', long, env = "PIPESET_TEAM", default_value = DEFAULT_TEAM, global = true)]
    team: String,

    #[arg(short, long, env = "PIPESET_USERNAME", default_value = DEFAULT_USERNAME, global = true)]
    username: String,

    #[arg(long, env = "PIPESET_PASSWORD", default_value = DEFAULT_PASSWORD, hide_env_values = true, global = true)]
    password: String,

    /// PEM file with an extra CA certificate to trust
    #[arg(long, env = "PIPESET_CA_CERT", global = true)]
    ca_cert: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long, env = "PIPESET_INSECURE", default_value_t = true, action = ArgAction::Set, global = true)]
    insecure: bool,

    /// Log every API request and response
    #[arg(long, env = "PIPESET_TRACING", default_value_t = true, action = ArgAction::Set, global = true)]
    tracing: bool,
}

impl TargetArgs {
    fn spec(&self) -> anyhow::Result<TargetSpec> {
        let ca_cert = match &self.ca_cert {
            Some(path) => commands::read_file(path)?,
            None => String::new(),
        };

        Ok(TargetSpec {
            name: self.target.as_str().into(),
            url: self.url.as_str().trim_end_matches('/').to_string(),
            team: self.team.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            ca_cert,
            insecure: self.insecure,
            tracing: self.tracing,
        })
    }
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Pipeline to set
    #[arg(short, long, env = "PIPESET_PIPELINE", default_value = DEFAULT_PIPELINE, global = true)]
    pipeline: String,

    /// Pipeline config file
    #[arg(short, long, env = "PIPESET_CONFIG", default_value = DEFAULT_CONFIG, global = true)]
    config: PathBuf,

    /// Template variable, as name=value
    #[arg(short = 'v', long = "var", default_value = DEFAULT_VAR, global = true)]
    vars: Vec<VariablePair>,

    /// Template variable whose value is parsed as YAML, as name=value
    #[arg(short = 'y', long = "yaml-var", global = true)]
    yaml_vars: Vec<YamlVariablePair>,

    /// YAML file of template variables; may be given more than once
    #[arg(short = 'l', long = "load-vars-from", global = true)]
    var_files: Vec<PathBuf>,

    /// Fail on unknown fields, duplicate keys and warnings
    #[arg(long, global = true)]
    strict: bool,

    /// Ask the server to check that credentials resolve
    #[arg(long, global = true)]
    check_creds: bool,
}

impl PipelineArgs {
    fn variables(&self) -> TemplateVariables {
        TemplateVariables {
            vars: self.vars.clone(),
            yaml_vars: self.yaml_vars.clone(),
            var_files: self.var_files.clone(),
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let vars = cli.pipeline.variables();

    match cli.command.unwrap_or(Commands::Apply) {
        Commands::Apply => {
            let spec = cli.target.spec()?;
            commands::apply(
                &spec,
                &cli.pipeline.pipeline,
                &cli.pipeline.config,
                &vars,
                cli.pipeline.check_creds,
            )
            .await?;
        }
        Commands::Validate => {
            commands::validate(&cli.pipeline.config, &vars, cli.pipeline.strict)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run(Cli::parse()).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
}
