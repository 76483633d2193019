//! Registration table for category units and type-name resolution.
//!
//! Units are declared at compile time. Each unit is named `<category>_config`
//! and lists the types it exports. The implementing type is picked by trying
//! the `<Category>Module` naming conventions in order, then by taking the
//! first exported module type.

use crate::error::{ConfigError, ConfigResult};
use crate::module::ModuleDefinition;
use heck::ToUpperCamelCase;

/// Suffix every unit name carries.
pub const UNIT_SUFFIX: &str = "_config";

/// Suffix of the implementing type name.
pub const TYPE_SUFFIX: &str = "Module";

pub type ModuleFactory = fn() -> Box<dyn ModuleDefinition>;

#[derive(Clone, Copy)]
pub enum ExportKind {
    /// Satisfies the module contract.
    Module(ModuleFactory),
    /// The shared base. Never instantiated.
    AbstractBase,
    /// Anything else the unit exposes.
    Other,
}

impl std::fmt::Debug for ExportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportKind::Module(_) => f.write_str("Module"),
            ExportKind::AbstractBase => f.write_str("AbstractBase"),
            ExportKind::Other => f.write_str("Other"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportedType {
    pub name: String,
    pub kind: ExportKind,
}

impl ExportedType {
    pub fn factory(&self) -> Option<ModuleFactory> {
        match self.kind {
            ExportKind::Module(factory) => Some(factory),
            _ => None,
        }
    }
}

fn boxed<T: ModuleDefinition + Default + 'static>() -> Box<dyn ModuleDefinition> {
    Box::new(T::default())
}

/// Short type name, without the module path.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// One category-definition unit.
#[derive(Debug, Clone)]
pub struct CategoryUnit {
    name: String,
    exports: Vec<ExportedType>,
}

impl CategoryUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exports: Vec::new(),
        }
    }

    /// Export a module type under its own type name.
    pub fn module<T: ModuleDefinition + Default + 'static>(self) -> Self {
        self.module_named(short_type_name::<T>(), boxed::<T>)
    }

    pub fn module_named(mut self, name: impl Into<String>, factory: ModuleFactory) -> Self {
        self.exports.push(ExportedType {
            name: name.into(),
            kind: ExportKind::Module(factory),
        });
        self
    }

    pub fn abstract_base(mut self, name: impl Into<String>) -> Self {
        self.exports.push(ExportedType {
            name: name.into(),
            kind: ExportKind::AbstractBase,
        });
        self
    }

    pub fn other(mut self, name: impl Into<String>) -> Self {
        self.exports.push(ExportedType {
            name: name.into(),
            kind: ExportKind::Other,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exports(&self) -> &[ExportedType] {
        &self.exports
    }

    /// Category identifier derived from the unit name.
    pub fn category(&self) -> Option<&str> {
        self.name
            .strip_suffix(UNIT_SUFFIX)
            .filter(|category| !category.is_empty())
    }

    /// Pick the implementing type for this unit.
    pub fn resolve(&self) -> ConfigResult<&ExportedType> {
        let category = self.category().ok_or_else(|| {
            ConfigError::discovery(&self.name, format!("unit name must end with '{UNIT_SUFFIX}'"))
        })?;

        for candidate in candidate_type_names(category) {
            if let Some(export) = self
                .exports
                .iter()
                .find(|e| e.name == candidate && e.factory().is_some())
            {
                return Ok(export);
            }
        }

        self.exports
            .iter()
            .find(|e| e.factory().is_some())
            .ok_or_else(|| ConfigError::discovery(&self.name, "no module type exported"))
    }
}

/// Type names tried for a category, in order, without duplicates.
///
/// For `vllm`: `VllmModule`, `VLLMModule`. For `document-processor`:
/// `DocumentProcessorModule`, `DOCUMENT-PROCESSORModule`,
/// `Document-processorModule`. The per-segment form splits on `_` and `-`
/// and lowercases each segment's tail, so `myHTTP-x` also yields
/// `MyhttpXModule`.
pub fn candidate_type_names(category: &str) -> Vec<String> {
    let upper_camel = category.to_upper_camel_case();
    let shouty = category.to_uppercase();
    let first_title = capitalize(category);
    let per_segment: String = category.split(['_', '-']).map(capitalize).collect();

    let mut names: Vec<String> = Vec::with_capacity(4);
    for stem in [upper_camel, shouty, first_title, per_segment] {
        let name = format!("{stem}{TYPE_SUFFIX}");
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// First character upper, rest lower.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
