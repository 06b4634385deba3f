use anyhow::{Context, Result};
use cloudsvc_provider::ProviderConfig;
use colored::Colorize;

pub fn show(cfg: &ProviderConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(cfg).context("Failed to render configuration")?;
    println!("{}", "# effective configuration".cyan());
    print!("{rendered}");
    Ok(())
}
