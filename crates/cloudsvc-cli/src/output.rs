use anyhow::Result;
use cloudsvc_provider::{ServiceRecord, ServiceResource};
use colored::Colorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

#[derive(Clone, Copy)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub show_secrets: bool,
}

pub fn print_record(resource: &ServiceResource, record: &ServiceRecord, opts: OutputOptions) -> Result<()> {
    let value = if opts.show_secrets {
        record.to_json()?
    } else {
        record.to_json_redacted(resource.registry(), resource.schema())?
    };
    print_value(&value, opts.format)
}

pub fn print_value(value: &Value, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Table => print_as_table(value),
    }
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Scalar attributes as rows, nested values as compact JSON.
fn print_as_table(value: &Value) {
    let Value::Object(map) = value else {
        println!("{value}");
        return;
    };
    let mut builder = Builder::default();
    builder.push_record(["Attribute", "Value"]);
    for (key, field) in map {
        let rendered = match field {
            Value::String(s) => s.clone(),
            Value::Array(list) if list.is_empty() => "[]".to_string(),
            other => other.to_string(),
        };
        builder.push_record([key.as_str(), rendered.as_str()]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}
