//! The registry: discovered categories, merged entries, and the consumer
//! operations built on them.

pub mod discovery;

pub use discovery::{CategoryUnit, ExportKind, ExportedType, ModuleFactory, candidate_type_names};

use crate::entry::ConfigEntry;
use crate::error::{ConfigError, ConfigResult};
use crate::module::{CategoryModule, ModuleContext, ModuleSummary};
use crate::projection::{AttrNode, CategoryView, ProjectionBuilder, ViewStyle, WrapperPolicy};
use crate::store::ValueStore;
use crate::types::{DataType, Variant};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of an update through the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateOutcome {
    pub old_value: Variant,
    pub new_value: Variant,
}

/// Per-entry outcome of [`Registry::refresh_all`].
#[derive(Debug, Default, Clone, Serialize)]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
    pub failed: BTreeMap<String, String>,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A unit that was skipped during discovery.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedUnit {
    pub unit: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrySummary {
    pub total_entries: usize,
    pub categories: BTreeMap<String, ModuleSummary>,
}

/// All discovered categories and the merged `name -> entry` map.
#[derive(Debug)]
pub struct Registry {
    modules: BTreeMap<String, CategoryModule>,
    entries: BTreeMap<String, Arc<ConfigEntry>>,
    skipped: Vec<SkippedUnit>,
    projection: ProjectionBuilder,
}

impl Registry {
    /// Construct one module per unit. A unit that fails is logged and
    /// skipped; the others still load.
    pub fn discover<I>(units: I, ctx: &ModuleContext) -> Self
    where
        I: IntoIterator<Item = CategoryUnit>,
    {
        let mut registry = Self {
            modules: BTreeMap::new(),
            entries: BTreeMap::new(),
            skipped: Vec::new(),
            projection: ProjectionBuilder::new(ctx.store.clone()),
        };

        for unit in units {
            match Self::load_unit(&unit, ctx) {
                Ok(module) => registry.insert(module),
                Err(e) => {
                    error!(unit = %unit.name(), error = %e, "Failed to load config unit");
                    registry.skipped.push(SkippedUnit {
                        unit: unit.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            categories = registry.modules.len(),
            entries = registry.entries.len(),
            skipped = registry.skipped.len(),
            "Config registry ready"
        );
        registry
    }

    fn load_unit(unit: &CategoryUnit, ctx: &ModuleContext) -> ConfigResult<CategoryModule> {
        let export = unit.resolve()?;
        let category = unit
            .category()
            .ok_or_else(|| ConfigError::discovery(unit.name(), "no category"))?;
        let factory = export
            .factory()
            .ok_or_else(|| ConfigError::discovery(unit.name(), "resolved type is not a module"))?;

        debug!(unit = %unit.name(), type_name = %export.name, "Resolved config module");
        let definition = factory();
        CategoryModule::build(category, &export.name, definition.as_ref(), ctx)
    }

    fn insert(&mut self, module: CategoryModule) {
        for (name, entry) in module.entries() {
            if let Some(previous) = self.entries.insert(name.clone(), Arc::clone(entry)) {
                warn!(
                    name = %name,
                    previous_path = %previous.path(),
                    path = %entry.path(),
                    "Config name declared by more than one category, keeping the later"
                );
            }
        }
        if let Some(previous) = self.modules.insert(module.category().to_string(), module) {
            warn!(category = %previous.category(), "Config category loaded twice, keeping the later");
        }
    }

    /// Replace the wrapper policy used by attribute views.
    pub fn with_wrapper_policy(mut self, policy: WrapperPolicy) -> Self {
        self.projection = self.projection.with_policy(policy);
        self
    }

    pub fn store(&self) -> &ValueStore {
        self.projection.store()
    }

    pub fn projection(&self) -> &ProjectionBuilder {
        &self.projection
    }

    pub fn skipped(&self) -> &[SkippedUnit] {
        &self.skipped
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Arc<ConfigEntry>)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn get_by_name(&self, name: &str) -> ConfigResult<&Arc<ConfigEntry>> {
        self.entries
            .get(name)
            .ok_or_else(|| ConfigError::not_found(name))
    }

    /// Cached value of a named entry.
    pub fn value(&self, name: &str) -> ConfigResult<Variant> {
        Ok(self.get_by_name(name)?.value())
    }

    /// Write a new value through the named entry.
    pub fn update(&self, name: &str, raw: impl Into<Variant>) -> ConfigResult<UpdateOutcome> {
        let entry = self.get_by_name(name)?;
        let old_value = entry.value();
        let new_value = entry.set_value(raw)?;

        info!(name = %name, old = %old_value, new = %new_value, "Config updated through registry");
        Ok(UpdateOutcome {
            old_value,
            new_value,
        })
    }

    /// Refresh every entry. A failing entry is logged and the rest continue.
    pub fn refresh_all(&self) -> RefreshReport {
        let mut report = RefreshReport::default();
        for (name, entry) in &self.entries {
            match entry.refresh() {
                Ok(_) => report.refreshed.push(name.clone()),
                Err(e) => {
                    error!(name = %name, path = %entry.path(), error = %e, "Failed to refresh config");
                    report.failed.insert(name.clone(), e.to_string());
                }
            }
        }
        info!(
            refreshed = report.refreshed.len(),
            failed = report.failed.len(),
            "Refreshed all configs"
        );
        report
    }

    /// Read-only rendering of every category.
    pub fn summary(&self) -> RegistrySummary {
        RegistrySummary {
            total_entries: self.entries.len(),
            categories: self
                .modules
                .iter()
                .map(|(category, module)| (category.clone(), module.summary()))
                .collect(),
        }
    }

    /// Stored value at a dotted path, read from the store.
    pub fn path_value(&self, path: &str) -> ConfigResult<Variant> {
        self.store()
            .try_get_record(path)?
            .map(|record| record.value)
            .ok_or_else(|| ConfigError::path_not_found(path))
    }

    pub fn category(&self, category: &str) -> ConfigResult<&CategoryModule> {
        self.modules
            .get(category)
            .ok_or_else(|| ConfigError::category_not_found(category))
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    /// Current values of one category's entries, by name.
    pub fn category_values(&self, category: &str) -> ConfigResult<BTreeMap<String, Variant>> {
        Ok(self.category(category)?.values())
    }

    pub fn category_view(&self, category: &str, style: ViewStyle) -> ConfigResult<CategoryView> {
        self.projection.category_view(category, style)
    }

    pub fn attributes(&self, category: &str) -> ConfigResult<AttrNode> {
        self.projection.attributes(category)
    }

    pub fn config_dict(&self, category: Option<&str>, flatten: bool) -> BTreeMap<String, Variant> {
        self.projection.config_dict(category, flatten)
    }

    pub fn values_for<S: AsRef<str>>(&self, paths: &[S]) -> BTreeMap<String, Option<Variant>> {
        self.projection.values_for(paths)
    }

    /// Path-level write that bypasses entries. Cached entry values stay
    /// stale until refreshed.
    pub fn update_path(&self, path: &str, value: &Variant, data_type: Option<DataType>) -> bool {
        self.projection.update_path(path, value, data_type)
    }
}
