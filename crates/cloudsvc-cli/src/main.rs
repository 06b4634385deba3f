mod cli;
mod commands;
mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cloudsvc_api::{HttpServiceApi, InMemoryServiceApi, ServiceApi};
use cloudsvc_provider::config::loader::read_config;
use cloudsvc_provider::{ProviderConfig, Secret, ServiceResource, observability};
use cloudsvc_schema::SchemaRegistry;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands, ConfigCommands};
use output::{OutputOptions, print_error};

#[tokio::main]
async fn main() {
    // .env is optional
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;

    let level = if cli.verbose { "debug" } else { cfg.logging.level.as_str() };
    observability::init_tracing_with_level(level);

    let opts = OutputOptions {
        format: cli.format.unwrap_or_default(),
        show_secrets: cli.show_secrets,
    };

    match &cli.command {
        Commands::Config(args) => match args.command {
            ConfigCommands::Show => commands::config::show(&cfg)?,
        },
        Commands::Schema(args) => {
            let registry = SchemaRegistry::builtin()?;
            match &args.user_config {
                Some(ty) => commands::schema::show_user_config(&registry, ty)?,
                None => commands::schema::show(&registry, cli.kind, args.datasource, opts.format)?,
            }
        }
        Commands::Create(args) => {
            let resource = make_resource(&cli, &cfg)?;
            let cancel = cancel_on_ctrl_c();
            commands::service::create(&resource, &args.file, opts, &cancel).await?;
        }
        Commands::Read(args) => {
            let resource = make_resource(&cli, &cfg)?;
            commands::service::read(&resource, &args.file, opts).await?;
        }
        Commands::Update(args) => {
            let resource = make_resource(&cli, &cfg)?;
            let cancel = cancel_on_ctrl_c();
            commands::service::update(&resource, &args.prior, &args.file, opts, &cancel).await?;
        }
        Commands::Delete(args) => {
            let resource = make_resource(&cli, &cfg)?;
            commands::service::delete(&resource, &args.file).await?;
        }
        Commands::Import(args) => {
            let resource = make_resource(&cli, &cfg)?;
            commands::service::import(&resource, &args.id, opts).await?;
        }
        Commands::Lookup(args) => {
            let resource = make_resource(&cli, &cfg)?;
            commands::service::lookup(&resource, &args.project, &args.service_name, opts).await?;
        }
    }

    Ok(())
}

/// File and `CLOUDSVC__*` settings, then command line overrides.
fn resolve_config(cli: &Cli) -> Result<ProviderConfig> {
    let mut cfg = read_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = &cli.api_url {
        cfg.api.url = url.clone();
    }
    if let Some(token) = &cli.token {
        cfg.api.token = Some(Secret::new(token.clone()));
    }
    cfg.validate().context("Invalid configuration")?;
    Ok(cfg)
}

fn make_resource(cli: &Cli, cfg: &ProviderConfig) -> Result<ServiceResource> {
    let registry = Arc::new(SchemaRegistry::builtin()?);
    let api: Arc<dyn ServiceApi> = if cli.dry_run {
        tracing::info!("Dry run: using the in-process backend");
        Arc::new(InMemoryServiceApi::new())
    } else {
        let http = reqwest::Client::builder()
            .timeout(cfg.api.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        let token = cfg.api.token.as_ref().map(|t| t.expose().to_string());
        Arc::new(HttpServiceApi::with_client(http, &cfg.api.url, token)?)
    };
    Ok(ServiceResource::new(cli.kind, registry, api, cfg))
}

/// Token cancelled on the first Ctrl-C so pending waits stop cleanly.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_url_replaces_invalid_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloudsvc.toml");
        std::fs::write(&path, "[api]\nurl = \"ftp://nowhere\"\n").unwrap();
        let config = path.to_str().unwrap();

        let cli = Cli::try_parse_from(["cloudsvc", "--config", config, "config", "show"]).unwrap();
        assert!(resolve_config(&cli).is_err());

        let cli = Cli::try_parse_from([
            "cloudsvc",
            "--config",
            config,
            "--api-url",
            "https://api.example.com",
            "--token",
            "t0ken",
            "config",
            "show",
        ])
        .unwrap();
        let cfg = resolve_config(&cli).unwrap();
        assert_eq!(cfg.api.url, "https://api.example.com");
        assert_eq!(cfg.api.token.as_ref().map(Secret::expose), Some("t0ken"));
    }
}
