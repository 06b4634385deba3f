use anyhow::{Context, Result};
use cloudsvc_core::ServiceType;
use cloudsvc_provider::LOOKUP_KEYS;
use cloudsvc_schema::{
    AttributeKind, AttributeSpec, Mutability, ResourceKind, ResourceSchema, SchemaRegistry,
};
use serde_json::{Value, json};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;
use crate::output::print_value;

pub fn show(
    registry: &SchemaRegistry,
    kind: ResourceKind,
    datasource: bool,
    format: OutputFormat,
) -> Result<()> {
    let schema = if datasource {
        registry.datasource_schema(kind, &LOOKUP_KEYS)
    } else {
        registry.resource_schema(kind)
    };
    match format {
        OutputFormat::Json => print_value(&schema_json(&schema), format),
        OutputFormat::Table => {
            print_table(&schema);
            Ok(())
        }
    }
}

/// Prints the user-config field tree of one service type as JSON.
pub fn show_user_config(registry: &SchemaRegistry, service_type: &str) -> Result<()> {
    let ty: ServiceType = service_type.parse()?;
    let shape = serde_json::to_value(registry.user_config(ty))
        .with_context(|| format!("Failed to render {ty} user config schema"))?;
    print_value(&shape, OutputFormat::Json)
}

fn schema_json(schema: &ResourceSchema) -> Value {
    json!({
        "kind": schema.kind.to_string(),
        "attributes": schema.attributes.iter().map(attribute_json).collect::<Vec<_>>(),
    })
}

fn attribute_json(attr: &AttributeSpec) -> Value {
    let mut value = json!({
        "name": attr.name,
        "type": kind_name(&attr.kind),
        "required": attr.required,
        "mutability": mutability_name(attr.mutability),
        "sensitive": attr.sensitive,
        "description": attr.description,
    });
    let nested = match &attr.kind {
        AttributeKind::Block(nested) => Some(nested),
        AttributeKind::List(item) => match item.as_ref() {
            AttributeKind::Block(nested) => Some(nested),
            _ => None,
        },
        _ => None,
    };
    if let Some(nested) = nested {
        value["attributes"] = Value::Array(nested.iter().map(attribute_json).collect());
    }
    value
}

fn print_table(schema: &ResourceSchema) {
    let mut builder = Builder::default();
    builder.push_record(["Attribute", "Type", "Required", "Mutability", "Sensitive", "Description"]);
    for attr in &schema.attributes {
        builder.push_record([
            attr.name.clone(),
            kind_name(&attr.kind),
            yes_no(attr.required).to_string(),
            mutability_name(attr.mutability).to_string(),
            yes_no(attr.sensitive).to_string(),
            attr.description.clone(),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}

fn kind_name(kind: &AttributeKind) -> String {
    match kind {
        AttributeKind::String => "string".into(),
        AttributeKind::Integer => "integer".into(),
        AttributeKind::Boolean => "boolean".into(),
        AttributeKind::List(item) => format!("list({})", kind_name(item)),
        AttributeKind::Block(_) => "block".into(),
        AttributeKind::UserConfig(ty) => format!("user_config({ty})"),
    }
}

fn mutability_name(mutability: Mutability) -> &'static str {
    match mutability {
        Mutability::Mutable => "mutable",
        Mutability::CreateOnly => "create_only",
        Mutability::Computed => "computed",
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_json_lists_nested_blocks() {
        let registry = SchemaRegistry::builtin().unwrap();
        let schema = registry.resource_schema(ResourceKind::Typed(ServiceType::Pg));
        let rendered = schema_json(&schema);

        assert_eq!(rendered["kind"], "pg");
        let attributes = rendered["attributes"].as_array().unwrap();
        let pg = attributes.iter().find(|a| a["name"] == "pg").unwrap();
        assert_eq!(pg["type"], "block");
        assert_eq!(pg["mutability"], "computed");
        assert!(
            pg["attributes"]
                .as_array()
                .unwrap()
                .iter()
                .any(|a| a["name"] == "password" && a["sensitive"] == true)
        );
        let user_config = attributes.iter().find(|a| a["name"] == "pg_user_config").unwrap();
        assert_eq!(user_config["type"], "user_config(pg)");
    }
}
