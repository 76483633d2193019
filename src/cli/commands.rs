//! Command handlers. Each renders a JSON value for the caller to print.

use super::Command;
use crate::projection::{CategoryView, ViewStyle};
use crate::registry::Registry;
use crate::types::Variant;
use anyhow::Result;
use serde_json::{Value, json};

/// Parse a command-line value as JSON, falling back to plain text.
pub fn parse_value(raw: &str) -> Variant {
    serde_json::from_str(raw).unwrap_or_else(|_| Variant::from(raw))
}

pub fn execute(registry: &Registry, command: &Command) -> Result<Value> {
    let output = match command {
        Command::Summary => serde_json::to_value(registry.summary())?,
        Command::Get { name } => match registry.get_by_name(name) {
            Ok(entry) => json!({
                "name": entry.name(),
                "path": entry.path(),
                "value": entry.value(),
                "default_value": entry.fallback(),
            }),
            // dotted arguments may be store paths
            Err(e) if e.code.is_not_found() && name.contains('.') => json!({
                "path": name,
                "value": registry.path_value(name)?,
            }),
            Err(e) => return Err(e.into()),
        },
        Command::Set { name, value } => {
            let outcome = registry.update(name, parse_value(value))?;
            json!({
                "name": name,
                "old_value": outcome.old_value,
                "new_value": outcome.new_value,
            })
        }
        Command::Refresh => serde_json::to_value(registry.refresh_all())?,
        Command::View { category, nested } => {
            let style = if *nested {
                ViewStyle::Nested
            } else {
                ViewStyle::Attribute
            };
            match registry.category_view(category, style)? {
                CategoryView::Nested(map) => serde_json::to_value(map)?,
                CategoryView::Attribute(node) => serde_json::to_value(node)?,
            }
        }
        Command::Dump { category, flat } => {
            serde_json::to_value(registry.config_dict(category.as_deref(), *flat))?
        }
        Command::Categories => json!({
            "categories": registry.category_names(),
            "stored": registry.store().list_categories(),
            "skipped": registry.skipped(),
        }),
    };
    Ok(output)
}
