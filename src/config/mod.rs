//! Settings for the registry process itself.
//!
//! These say where the store lives and where side-car files are read from.
//! They are loaded from four tiers, each overriding the last:
//! 1. **Defaults** - [`RegistrySettings::default`]
//! 2. **Project** - `$CWD/settings-registry/config.yaml`
//! 3. **User** - `~/.settings-registry/config.yaml`
//! 4. **Environment** - see below
//!
//! YAML tiers are deep-merged field by field.
//!
//! ## Environment Variables
//! - `SETTINGS_REGISTRY_CONFIG_PATH` - Explicit config file (replaces tiers 2 and 3)
//! - `SETTINGS_REGISTRY_DB_PATH` - SQLite store path
//! - `SETTINGS_REGISTRY_KEY_PREFIX` - Store key prefix
//! - `SETTINGS_REGISTRY_SECRETS_DIR` - Side-car file directory

mod loader;
mod merge;

pub use loader::{SettingsLoader, SettingsPaths, SettingsTier};
pub use merge::{deep_merge, deep_merge_all};

use crate::module::ModuleContext;
use crate::store::{DEFAULT_KEY_PREFIX, SqliteBackend, ValueStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub db_path: PathBuf,
    pub key_prefix: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("settings-registry/registry.db"),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub store: StoreSettings,
    /// Directory relative side-car file names resolve against.
    pub secrets_dir: Option<PathBuf>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            secrets_dir: Some(PathBuf::from("settings-registry/secrets")),
        }
    }
}

impl RegistrySettings {
    /// Open the SQLite-backed store these settings point at.
    pub fn open_store(&self) -> anyhow::Result<ValueStore> {
        let backend = SqliteBackend::open(&self.store.db_path)?;
        Ok(ValueStore::with_prefix(Arc::new(backend), self.store.key_prefix.clone()))
    }

    /// Module context over `store`, reading the process environment.
    pub fn module_context(&self, store: ValueStore) -> ModuleContext {
        let ctx = ModuleContext::new(store);
        match &self.secrets_dir {
            Some(dir) => ctx.with_sidecar_dir(dir),
            None => ctx,
        }
    }
}
