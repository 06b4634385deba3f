use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use cloudsvc_provider::{ReadOutcome, ServiceDataSource, ServiceResource};
use colored::Colorize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::output::{OutputOptions, print_record, print_success, print_warning};

fn read_body(file: &Option<String>) -> Result<Value> {
    let content = match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            buf
        }
    };
    serde_json::from_str(&content).context("Invalid JSON")
}

pub async fn create(
    resource: &ServiceResource,
    file: &Option<String>,
    opts: OutputOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let planned = resource.decode(&read_body(file)?)?;
    let created = resource.create(&planned, cancel).await?;
    print_success(&format!(
        "Created {} {}",
        resource.kind().to_string().cyan(),
        created.service_id()?.to_string().cyan()
    ));
    print_record(resource, &created, opts)
}

pub async fn read(resource: &ServiceResource, file: &Option<String>, opts: OutputOptions) -> Result<()> {
    let current = resource.decode(&read_body(file)?)?;
    match resource.read(&current).await? {
        ReadOutcome::Present(record) => print_record(resource, &record, opts),
        ReadOutcome::Gone => {
            print_warning(&format!(
                "Service {} no longer exists; drop the local record",
                current.service_id()?
            ));
            Ok(())
        }
    }
}

pub async fn update(
    resource: &ServiceResource,
    prior: &str,
    file: &Option<String>,
    opts: OutputOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let prior = resource.decode(&read_body(&Some(prior.to_string()))?)?;
    let planned = resource.decode(&read_body(file)?)?;
    let updated = resource.update(&prior, &planned, cancel).await?;
    print_success(&format!("Updated {}", updated.service_id()?.to_string().cyan()));
    print_record(resource, &updated, opts)
}

pub async fn delete(resource: &ServiceResource, file: &Option<String>) -> Result<()> {
    let current = resource.decode(&read_body(file)?)?;
    resource.delete(&current).await?;
    print_success(&format!("Deleted {}", current.service_id()?.to_string().cyan()));
    Ok(())
}

pub async fn import(resource: &ServiceResource, id: &str, opts: OutputOptions) -> Result<()> {
    let record = resource
        .import(id)
        .await
        .with_context(|| format!("Failed to import {id}"))?;
    print_record(resource, &record, opts)
}

pub async fn lookup(
    resource: &ServiceResource,
    project: &str,
    service_name: &str,
    opts: OutputOptions,
) -> Result<()> {
    let datasource = ServiceDataSource::new(resource.clone());
    let record = datasource.read(project, service_name).await?;
    print_record(resource, &record, opts)
}
