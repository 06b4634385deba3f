use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use cloudsvc_core::ServiceType;
use cloudsvc_schema::ResourceKind;

#[derive(Parser)]
#[command(name = "cloudsvc")]
#[command(about = "cloudsvc: create, update and inspect managed cloud services from JSON records")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file (defaults to ./cloudsvc.toml)
    #[arg(short, long, global = true, env = "CLOUDSVC_CONFIG")]
    pub config: Option<PathBuf>,

    /// API base URL (overrides the configuration file)
    #[arg(long, global = true, env = "CLOUDSVC_API_URL")]
    pub api_url: Option<String>,

    /// API token (overrides the configuration file)
    #[arg(long, global = true, env = "CLOUDSVC_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Resource kind: "service" for the generic resource, or a service type such as "pg"
    #[arg(short, long, global = true, default_value = "service", value_parser = parse_kind)]
    pub kind: ResourceKind,

    /// Run against an in-process backend instead of the remote API
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Print sensitive values instead of masking them
    #[arg(long, global = true)]
    pub show_secrets: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a service and wait until it is running
    Create(RecordArgs),
    /// Refresh a service record from the remote
    Read(RecordArgs),
    /// Apply a planned record over a prior one
    Update(UpdateArgs),
    /// Delete a service
    Delete(RecordArgs),
    /// Build a record from an identity such as project/service
    Import(ImportArgs),
    /// Look up an existing service by project and name
    Lookup(LookupArgs),
    /// Print the attribute schema of the resource kind
    Schema(SchemaArgs),
    /// Inspect the effective configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct RecordArgs {
    /// Path to a JSON record (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct UpdateArgs {
    /// Path to the record returned by the previous create, read or update
    #[arg(long)]
    pub prior: String,
    /// Path to the planned JSON record (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct ImportArgs {
    /// Resource identity (e.g. my-project/my-service)
    pub id: String,
}

#[derive(clap::Args)]
pub struct LookupArgs {
    pub project: String,
    pub service_name: String,
}

#[derive(clap::Args)]
pub struct SchemaArgs {
    /// Show the read-only lookup variant
    #[arg(long)]
    pub datasource: bool,
    /// Show the user config field tree of a service type instead
    #[arg(long)]
    pub user_config: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration with secrets masked
    Show,
}

fn parse_kind(value: &str) -> Result<ResourceKind, String> {
    if value == "service" {
        return Ok(ResourceKind::Service);
    }
    value
        .parse::<ServiceType>()
        .map(ResourceKind::Typed)
        .map_err(|e| e.to_string())
}
