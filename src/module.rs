//! Category modules: named groups of entries built by a fixed contract.
//!
//! A [`ModuleDefinition`] declares its settings through an [`Initializer`].
//! Each setting resolves a fallback from three tiers, in order:
//! 1. **Environment** - the named variable, converted
//! 2. **Side-car file** - trimmed file contents, converted
//! 3. **Default** - the hardcoded value, converted
//!
//! A conversion failure in tier 1 or 2 is logged and the next tier is tried.
//! A failure in tier 3, or any error returned by the definition, rejects the
//! whole module.

use crate::convert::{Converter, convert_opt};
use crate::entry::{ConfigEntry, EntryDefinition};
use crate::env::{EnvSource, ProcessEnv};
use crate::error::{ConfigError, ConfigResult};
use crate::store::ValueStore;
use crate::types::{DataType, Variant};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared collaborators handed to every module at construction.
#[derive(Clone)]
pub struct ModuleContext {
    pub store: ValueStore,
    pub env: Arc<dyn EnvSource>,
    /// Base directory for relative side-car file paths.
    pub sidecar_dir: Option<PathBuf>,
}

impl ModuleContext {
    /// Context reading the real process environment.
    pub fn new(store: ValueStore) -> Self {
        Self {
            store,
            env: Arc::new(ProcessEnv),
            sidecar_dir: None,
        }
    }

    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn with_sidecar_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sidecar_dir = Some(dir.into());
        self
    }

    fn sidecar_path(&self, file: &Path) -> PathBuf {
        match &self.sidecar_dir {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file.to_path_buf(),
        }
    }
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext")
            .field("store", &self.store)
            .field("sidecar_dir", &self.sidecar_dir)
            .finish_non_exhaustive()
    }
}

/// Declaration of one setting inside a module.
#[derive(Debug, Clone)]
pub struct SettingSpec {
    /// Environment variable name, also the entry's lookup name.
    pub env_name: String,
    pub path: String,
    pub default: Variant,
    pub file: Option<PathBuf>,
    pub converter: Option<Converter>,
    pub data_type: Option<DataType>,
}

impl SettingSpec {
    pub fn new(env_name: impl Into<String>, path: impl Into<String>, default: impl Into<Variant>) -> Self {
        Self {
            env_name: env_name.into(),
            path: path.into(),
            default: default.into(),
            file: None,
            converter: None,
            data_type: None,
        }
    }

    /// Read the value from this side-car file when the variable is unset.
    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }
}

/// Contract every category implements.
pub trait ModuleDefinition: Send + Sync {
    /// Declare the module's settings.
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()>;

    /// Runs once all settings exist. An error rejects the module.
    fn after_initialize(&self, _module: &CategoryModule) -> ConfigResult<()> {
        Ok(())
    }
}

/// Collects the entries of one module while it initializes.
pub struct Initializer<'a> {
    category: &'a str,
    ctx: &'a ModuleContext,
    entries: BTreeMap<String, Arc<ConfigEntry>>,
}

impl<'a> Initializer<'a> {
    fn new(category: &'a str, ctx: &'a ModuleContext) -> Self {
        Self {
            category,
            ctx,
            entries: BTreeMap::new(),
        }
    }

    pub fn category(&self) -> &str {
        self.category
    }

    /// Resolve the fallback value for a setting from its three tiers.
    pub fn resolve(&self, spec: &SettingSpec) -> ConfigResult<Variant> {
        let converter = spec.converter.as_ref();

        // Tier 1: environment variable
        if let Some(raw) = self.ctx.env.var(&spec.env_name) {
            match convert_opt(converter, &Variant::String(raw)) {
                Ok(value) => {
                    debug!(name = %spec.env_name, "Loaded from environment");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(name = %spec.env_name, error = %e, "Failed to convert environment value");
                }
            }
        }

        // Tier 2: side-car file
        if let Some(file) = &spec.file {
            let path = self.ctx.sidecar_path(file);
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(content) => {
                        let content = content.trim();
                        if !content.is_empty() {
                            match convert_opt(converter, &Variant::from(content)) {
                                Ok(value) => {
                                    debug!(
                                        name = %spec.env_name,
                                        file = %path.display(),
                                        "Loaded from side-car file"
                                    );
                                    return Ok(value);
                                }
                                Err(e) => {
                                    warn!(
                                        name = %spec.env_name,
                                        file = %path.display(),
                                        error = %e,
                                        "Failed to convert side-car file value"
                                    );
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!(
                            name = %spec.env_name,
                            file = %path.display(),
                            error = %e,
                            "Failed to read side-car file"
                        );
                    }
                }
            }
        }

        // Tier 3: hardcoded default
        debug!(name = %spec.env_name, "Using default value");
        convert_opt(converter, &spec.default).map_err(|e| e.with_field(spec.env_name.clone()))
    }

    /// Resolve a setting and create its entry.
    pub fn setting(&mut self, spec: SettingSpec) -> ConfigResult<Arc<ConfigEntry>> {
        let fallback = self.resolve(&spec)?;

        let definition = EntryDefinition {
            name: spec.env_name.clone(),
            path: spec.path,
            fallback,
            converter: spec.converter,
            data_type: spec.data_type,
        };
        let entry = Arc::new(ConfigEntry::load(definition, self.ctx.store.clone()));

        if self
            .entries
            .insert(spec.env_name.clone(), Arc::clone(&entry))
            .is_some()
        {
            warn!(category = %self.category, name = %spec.env_name, "Setting declared twice, keeping the last");
        }
        Ok(entry)
    }

    /// Entry declared earlier in this initialization.
    pub fn get(&self, name: &str) -> Option<&Arc<ConfigEntry>> {
        self.entries.get(name)
    }
}

/// Per-entry row of a module summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySummary {
    pub current_value: Variant,
    pub default_value: Variant,
    pub path: String,
}

/// Read-only rendering of a module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleSummary {
    pub type_name: String,
    pub entry_count: usize,
    pub entries: BTreeMap<String, EntrySummary>,
}

/// A constructed category: its name and the entries it owns.
#[derive(Debug)]
pub struct CategoryModule {
    category: String,
    type_name: String,
    entries: BTreeMap<String, Arc<ConfigEntry>>,
}

impl CategoryModule {
    /// Run a definition's initialization. All-or-nothing: any error rejects
    /// the module and no module is returned.
    pub fn build(
        category: &str,
        type_name: &str,
        definition: &dyn ModuleDefinition,
        ctx: &ModuleContext,
    ) -> ConfigResult<Self> {
        let mut init = Initializer::new(category, ctx);
        definition
            .initialize(&mut init)
            .map_err(|e| ConfigError::initialization(category, &e))?;

        let module = Self {
            category: category.to_string(),
            type_name: type_name.to_string(),
            entries: init.entries,
        };

        definition
            .after_initialize(&module)
            .map_err(|e| ConfigError::initialization(category, &e))?;

        info!(category = %category, count = module.entries.len(), "Initialized config category");
        Ok(module)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn entries(&self) -> &BTreeMap<String, Arc<ConfigEntry>> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> ConfigResult<&Arc<ConfigEntry>> {
        self.entries.get(name).ok_or_else(|| {
            ConfigError::not_found(name).with_details(format!("in category '{}'", self.category))
        })
    }

    /// Current value of every entry, by name.
    pub fn values(&self) -> BTreeMap<String, Variant> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.value()))
            .collect()
    }

    pub fn summary(&self) -> ModuleSummary {
        ModuleSummary {
            type_name: self.type_name.clone(),
            entry_count: self.entries.len(),
            entries: self
                .entries
                .iter()
                .map(|(name, entry)| {
                    (
                        name.clone(),
                        EntrySummary {
                            current_value: entry.value(),
                            default_value: entry.fallback().clone(),
                            path: entry.path().to_string(),
                        },
                    )
                })
                .collect(),
        }
    }
}
