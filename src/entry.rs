//! A single named, layered, persisted setting.
//!
//! An entry caches its current value in memory and mirrors it to the
//! [`ValueStore`]. Construction runs a read-or-initialize step: a stored
//! record wins over the fallback, and a missing record is created from the
//! fallback. The read and the write are separate store calls, so two
//! processes initializing the same path at once may both write; the store
//! ends up holding one of the two values.

use crate::convert::{Converter, convert_opt};
use crate::error::{ConfigError, ConfigResult};
use crate::store::ValueStore;
use crate::types::{DataType, Variant};
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Everything needed to create an entry.
#[derive(Debug, Clone)]
pub struct EntryDefinition {
    /// Lookup key in the registry.
    pub name: String,
    /// Dotted store path.
    pub path: String,
    /// Tier-resolved value used when the store has no record.
    pub fallback: Variant,
    pub converter: Option<Converter>,
    /// Storage tag; inferred from the value when absent.
    pub data_type: Option<DataType>,
}

impl EntryDefinition {
    pub fn new(name: impl Into<String>, path: impl Into<String>, fallback: impl Into<Variant>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            fallback: fallback.into(),
            converter: None,
            data_type: None,
        }
    }

    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }
}

/// Cached, write-through setting.
#[derive(Debug)]
pub struct ConfigEntry {
    name: String,
    path: String,
    fallback: Variant,
    converter: Option<Converter>,
    data_type: Option<DataType>,
    current: ArcSwap<Variant>,
    store: ValueStore,
}

impl ConfigEntry {
    /// Create an entry and run the read-or-initialize step.
    ///
    /// Never fails: store problems are logged and the fallback is used.
    pub fn load(definition: EntryDefinition, store: ValueStore) -> Self {
        let EntryDefinition {
            name,
            path,
            fallback,
            converter,
            data_type,
        } = definition;

        let entry = Self {
            current: ArcSwap::from_pointee(fallback.clone()),
            name,
            path,
            fallback,
            converter,
            data_type,
            store,
        };
        entry.initialize();
        entry
    }

    /// Shorthand for [`ConfigEntry::load`].
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        fallback: impl Into<Variant>,
        converter: Option<Converter>,
        store: ValueStore,
    ) -> Self {
        let mut definition = EntryDefinition::new(name, path, fallback);
        definition.converter = converter;
        Self::load(definition, store)
    }

    fn initialize(&self) {
        match self.store.try_get_record(&self.path) {
            Ok(Some(record)) => match convert_opt(self.converter.as_ref(), &record.value) {
                Ok(value) => {
                    debug!(name = %self.name, path = %self.path, "Loaded config from store");
                    self.current.store(Arc::new(value));
                }
                Err(e) => {
                    warn!(
                        name = %self.name,
                        path = %self.path,
                        error = %e,
                        "Stored config value failed conversion, using fallback"
                    );
                }
            },
            Ok(None) => {
                self.persist_fallback();
            }
            Err(e) => {
                warn!(
                    name = %self.name,
                    path = %self.path,
                    error = %e,
                    "Failed to load config from store, using fallback"
                );
            }
        }
    }

    fn persist_fallback(&self) {
        if self
            .store
            .set_record(&self.path, &self.fallback, self.data_type, None)
        {
            debug!(name = %self.name, path = %self.path, "Initialized config record from fallback");
        } else {
            warn!(name = %self.name, path = %self.path, "Failed to persist fallback value");
        }
        self.current.store(Arc::new(self.fallback.clone()));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The tier-resolved value this entry was created with.
    pub fn fallback(&self) -> &Variant {
        &self.fallback
    }

    pub fn converter(&self) -> Option<&Converter> {
        self.converter.as_ref()
    }

    /// Cached value. No store round-trip.
    pub fn value(&self) -> Variant {
        Variant::clone(&self.current.load())
    }

    /// Convert `raw`, write it through to the store, then update the cache.
    ///
    /// Returns the converted value. A rejected value leaves everything
    /// untouched; a failed store write is reported as a write failure and
    /// the cache keeps its previous value.
    pub fn set_value(&self, raw: impl Into<Variant>) -> ConfigResult<Variant> {
        let raw = raw.into();
        let value = convert_opt(self.converter.as_ref(), &raw)?;

        if !self
            .store
            .set_record(&self.path, &value, self.data_type, None)
        {
            error!(name = %self.name, path = %self.path, "Failed to update config");
            return Err(ConfigError::store_write(&self.path));
        }

        self.current.store(Arc::new(value.clone()));
        info!(name = %self.name, path = %self.path, "Updated config");
        debug!(path = %self.path, value = %value, "New config value");
        Ok(value)
    }

    /// Re-read the stored record, overwriting the cache.
    ///
    /// A missing record is recreated from the fallback. An unreachable store
    /// or a stored value the converter rejects is an error and leaves the
    /// cache as it was.
    pub fn refresh(&self) -> ConfigResult<Variant> {
        match self.store.try_get_record(&self.path)? {
            Some(record) => {
                let value = convert_opt(self.converter.as_ref(), &record.value)?;
                self.current.store(Arc::new(value.clone()));
                Ok(value)
            }
            None => {
                self.persist_fallback();
                Ok(self.fallback.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::store::MemoryBackend;

    fn setup() -> (ValueStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        (ValueStore::new(backend.clone()), backend)
    }

    #[test]
    fn test_initialize_persists_fallback() {
        let (store, _) = setup();
        let entry = ConfigEntry::new("PORT", "app.port", 8000, Some(Converter::Int), store.clone());

        assert_eq!(entry.value(), Variant::Int(8000));
        let record = store.get_record("app.port").unwrap();
        assert_eq!(record.value, Variant::Int(8000));
        assert_eq!(record.data_type, DataType::Int);
    }

    #[test]
    fn test_existing_record_overrides_fallback() {
        let (store, _) = setup();
        store.set_record("app.port", &Variant::from("9100"), None, None);

        let entry = ConfigEntry::new("PORT", "app.port", 8000, Some(Converter::Int), store.clone());
        assert_eq!(entry.value(), Variant::Int(9100));
        // stored raw value is left as it was
        assert_eq!(store.value("app.port"), Some(Variant::from("9100")));
    }

    #[test]
    fn test_unconvertible_stored_value_uses_fallback() {
        let (store, _) = setup();
        store.set_record("app.port", &Variant::from("not a port"), None, None);

        let entry = ConfigEntry::new("PORT", "app.port", 8000, Some(Converter::Int), store.clone());
        assert_eq!(entry.value(), Variant::Int(8000));
        assert_eq!(store.value("app.port"), Some(Variant::from("not a port")));
    }

    #[test]
    fn test_unreachable_store_uses_fallback_without_writing() {
        let (store, backend) = setup();
        backend.set_unavailable(true);
        let entry = ConfigEntry::new("HOST", "app.host", "0.0.0.0", None, store.clone());
        assert_eq!(entry.value(), Variant::from("0.0.0.0"));

        backend.set_unavailable(false);
        assert!(store.get_record("app.host").is_none());
    }

    #[test]
    fn test_explicit_data_type_is_recorded() {
        let (store, _) = setup();
        let definition =
            EntryDefinition::new("RAW", "app.raw", "1").with_data_type(DataType::Int);
        let _entry = ConfigEntry::load(definition, store.clone());
        assert_eq!(store.get_record("app.raw").unwrap().data_type, DataType::Int);
    }

    #[test]
    fn test_set_value_converts_and_writes_through() {
        let (store, _) = setup();
        let entry = ConfigEntry::new("DEBUG_MODE", "app.debug_mode", true, Some(Converter::Bool), store.clone());

        let stored = entry.set_value("off").unwrap();
        assert_eq!(stored, Variant::Bool(false));
        assert_eq!(entry.value(), Variant::Bool(false));
        assert_eq!(store.value("app.debug_mode"), Some(Variant::Bool(false)));
    }

    #[test]
    fn test_set_value_rejected_leaves_cache() {
        let (store, _) = setup();
        let entry = ConfigEntry::new("PORT", "app.port", 8000, Some(Converter::Int), store);

        let err = entry.set_value("eighty").unwrap_err();
        assert_eq!(err.code, ErrorCode::TypeConversionFailure);
        assert_eq!(entry.value(), Variant::Int(8000));
    }

    #[test]
    fn test_set_value_store_failure_raises() {
        let (store, backend) = setup();
        let entry = ConfigEntry::new("PORT", "app.port", 8000, Some(Converter::Int), store);

        backend.set_read_only(true);
        let err = entry.set_value(9000).unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreWriteFailure);
        assert_eq!(entry.value(), Variant::Int(8000));
    }

    #[test]
    fn test_refresh_picks_up_out_of_band_change() {
        let (store, _) = setup();
        let entry = ConfigEntry::new("PORT", "app.port", 8000, Some(Converter::Int), store.clone());

        store.set_record("app.port", &Variant::Int(8123), None, None);
        assert_eq!(entry.value(), Variant::Int(8000));

        assert_eq!(entry.refresh().unwrap(), Variant::Int(8123));
        assert_eq!(entry.value(), Variant::Int(8123));
    }

    #[test]
    fn test_refresh_recreates_deleted_record() {
        let (store, _) = setup();
        let entry = ConfigEntry::new("PORT", "app.port", 8000, Some(Converter::Int), store.clone());
        entry.set_value(9000).unwrap();
        store.delete_record("app.port");

        assert_eq!(entry.refresh().unwrap(), Variant::Int(8000));
        assert_eq!(store.value("app.port"), Some(Variant::Int(8000)));
    }

    #[test]
    fn test_refresh_failure_keeps_cache() {
        let (store, backend) = setup();
        let entry = ConfigEntry::new("PORT", "app.port", 8000, Some(Converter::Int), store.clone());

        store.set_record("app.port", &Variant::from("not a port"), None, None);
        assert_eq!(
            entry.refresh().unwrap_err().code,
            ErrorCode::TypeConversionFailure
        );

        backend.set_unavailable(true);
        assert_eq!(entry.refresh().unwrap_err().code, ErrorCode::StoreUnavailable);
        assert_eq!(entry.value(), Variant::Int(8000));
    }
}
