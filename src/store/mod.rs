//! Persistent value store with a per-category index.
//!
//! Every operation here fails soft: transport errors and missing keys are
//! logged and turned into `false`, `None`, a default, or an empty listing.
//! The one exception is [`ValueStore::try_get_record`], which reports
//! transport errors so that entries can tell "absent" from "unreachable".
//!
//! ## Key layout
//! - `<prefix>:<path>` holds the JSON envelope for one setting
//! - `<prefix>:category:<name>` is a set of dotted paths in that category
//!
//! The envelope write and the index add are two separate backend calls. A
//! crash between them leaves the index without its record (or the reverse);
//! listings skip index members whose record is missing.

mod backend;
mod memory;
mod sqlite;

pub use backend::{BackendError, BackendResult, KvBackend};
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use crate::error::{ConfigError, ConfigResult};
use crate::projection::build_nested;
use crate::types::{DataType, Record, Variant, category_of};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Key prefix used when none is configured.
pub const DEFAULT_KEY_PREFIX: &str = "config";

/// Shared handle to the persistent store. Cheap to clone.
#[derive(Clone)]
pub struct ValueStore {
    backend: Arc<dyn KvBackend>,
    prefix: String,
}

impl ValueStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self::with_prefix(backend, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(backend: Arc<dyn KvBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    /// Store backed by a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn record_key(&self, path: &str) -> String {
        format!("{}:{}", self.prefix, path)
    }

    fn index_prefix(&self) -> String {
        format!("{}:category:", self.prefix)
    }

    fn index_key(&self, category: &str) -> String {
        format!("{}{}", self.index_prefix(), category)
    }

    // ========== Records ==========

    /// Write the envelope for `path` and add it to its category index.
    ///
    /// `data_type` is inferred from the value when absent; `category`
    /// defaults to the first segment of the path.
    pub fn set_record(
        &self,
        path: &str,
        value: &Variant,
        data_type: Option<DataType>,
        category: Option<&str>,
    ) -> bool {
        let record = Record {
            value: value.clone(),
            data_type: data_type.unwrap_or_else(|| DataType::infer(value)),
            category: category.unwrap_or_else(|| category_of(path)).to_string(),
            path: path.to_string(),
        };

        match self.write_record(&record) {
            Ok(()) => {
                debug!(path = %path, value = %value, "Stored config record");
                true
            }
            Err(e) => {
                error!(path = %path, error = %e, "Failed to store config record");
                false
            }
        }
    }

    fn write_record(&self, record: &Record) -> ConfigResult<()> {
        if !record.value.is_finite() {
            return Err(ConfigError::internal(format!(
                "non-finite float at '{}' cannot be stored",
                record.path
            )));
        }
        let envelope = serde_json::to_string(record).map_err(ConfigError::internal)?;
        self.backend
            .set(&self.record_key(&record.path), &envelope)
            .map_err(ConfigError::store_unavailable)?;
        self.backend
            .set_add(&self.index_key(&record.category), &record.path)
            .map_err(ConfigError::store_unavailable)?;
        Ok(())
    }

    /// Full envelope for `path`, reporting transport and decoding errors.
    pub fn try_get_record(&self, path: &str) -> ConfigResult<Option<Record>> {
        let raw = self
            .backend
            .get(&self.record_key(path))
            .map_err(ConfigError::store_unavailable)?;

        match raw {
            Some(raw) => serde_json::from_str::<Record>(&raw)
                .map(Some)
                .map_err(|e| {
                    ConfigError::store_unavailable(format!("corrupt envelope at '{}': {}", path, e))
                }),
            None => Ok(None),
        }
    }

    /// Full envelope for `path`, or `None` when missing or unreadable.
    pub fn get_record(&self, path: &str) -> Option<Record> {
        match self.try_get_record(path) {
            Ok(record) => record,
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read config record");
                None
            }
        }
    }

    /// Stored value for `path`, or `None`.
    pub fn value(&self, path: &str) -> Option<Variant> {
        self.get_record(path).map(|record| record.value)
    }

    /// Stored value for `path`, or `default`.
    pub fn get_value(&self, path: &str, default: Variant) -> Variant {
        self.value(path).unwrap_or(default)
    }

    /// Whether an envelope exists at `path`.
    pub fn exists(&self, path: &str) -> bool {
        match self.backend.exists(&self.record_key(path)) {
            Ok(exists) => exists,
            Err(e) => {
                error!(path = %path, error = %e, "Failed to check config existence");
                false
            }
        }
    }

    /// Remove the envelope and its index membership. Best effort.
    pub fn delete_record(&self, path: &str) -> bool {
        // records written with an explicit category are indexed there
        let category = self
            .get_record(path)
            .map(|record| record.category)
            .unwrap_or_else(|| category_of(path).to_string());

        let result = self
            .backend
            .delete(&self.record_key(path))
            .and_then(|_| self.backend.set_remove(&self.index_key(&category), path));

        match result {
            Ok(()) => {
                debug!(path = %path, "Deleted config record");
                true
            }
            Err(e) => {
                error!(path = %path, error = %e, "Failed to delete config record");
                false
            }
        }
    }

    // ========== Listings ==========

    /// Records indexed under `category`, sorted by path.
    pub fn list_category_records(&self, category: &str) -> Vec<Record> {
        let members = match self.backend.set_members(&self.index_key(category)) {
            Ok(members) => members,
            Err(e) => {
                error!(category = %category, error = %e, "Failed to list category index");
                return Vec::new();
            }
        };

        let mut records: Vec<Record> = members
            .iter()
            .filter_map(|path| self.get_record(path))
            .collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        records
    }

    /// Records of `category` re-nested by splitting paths on `.`.
    ///
    /// The category name itself stays as the top-level key.
    pub fn list_category_nested(&self, category: &str) -> BTreeMap<String, Variant> {
        build_nested(&self.list_category_records(category))
    }

    /// Every record under this prefix, excluding index keys, sorted by path.
    pub fn list_all_records(&self) -> Vec<Record> {
        let keys = match self.backend.keys_with_prefix(&format!("{}:", self.prefix)) {
            Ok(keys) => keys,
            Err(e) => {
                error!(error = %e, "Failed to scan config records");
                return Vec::new();
            }
        };

        let index_prefix = self.index_prefix();
        let record_prefix_len = self.prefix.len() + 1;
        let mut records: Vec<Record> = keys
            .iter()
            .filter(|key| !key.starts_with(&index_prefix))
            .filter_map(|key| self.get_record(&key[record_prefix_len..]))
            .collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        records
    }

    /// Category names derived from index keys, sorted.
    pub fn list_categories(&self) -> Vec<String> {
        let index_prefix = self.index_prefix();
        match self.backend.keys_with_prefix(&index_prefix) {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|key| key.strip_prefix(&index_prefix).map(str::to_string))
                .collect(),
            Err(e) => {
                error!(error = %e, "Failed to list config categories");
                Vec::new()
            }
        }
    }

    /// Delete every record in `category` and the index itself.
    pub fn clear_category(&self, category: &str) -> bool {
        let index_key = self.index_key(category);
        let members = match self.backend.set_members(&index_key) {
            Ok(members) => members,
            Err(e) => {
                error!(category = %category, error = %e, "Failed to clear category");
                return false;
            }
        };

        for path in &members {
            if let Err(e) = self.backend.delete(&self.record_key(path)) {
                warn!(path = %path, error = %e, "Failed to delete record while clearing category");
            }
        }

        match self.backend.delete(&index_key) {
            Ok(_) => {
                info!(category = %category, count = members.len(), "Cleared config category");
                true
            }
            Err(e) => {
                error!(category = %category, error = %e, "Failed to delete category index");
                false
            }
        }
    }
}

impl std::fmt::Debug for ValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
