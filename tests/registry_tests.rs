//! Integration tests for discovery, the consumer operations, and tier
//! resolution through a full registry.

use settings_registry::categories::builtin_units;
use settings_registry::convert::Converter;
use settings_registry::env::StaticEnv;
use settings_registry::error::{ConfigError, ConfigResult, ErrorCode, ResponseClass};
use settings_registry::module::{Initializer, ModuleContext, ModuleDefinition, SettingSpec};
use settings_registry::registry::{CategoryUnit, Registry};
use settings_registry::store::{MemoryBackend, ValueStore};
use settings_registry::types::Variant;
use std::sync::Arc;
use tempfile::TempDir;

/// In-memory store plus a handle to its backend for failure injection.
fn setup_store() -> (ValueStore, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    (ValueStore::new(backend.clone()), backend)
}

fn context(store: ValueStore) -> ModuleContext {
    ModuleContext::new(store).with_env(StaticEnv::new())
}

#[derive(Default)]
struct ThreeSettings;

impl ModuleDefinition for ThreeSettings {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        init.setting(SettingSpec::new("A_COUNT", "trio.a", 1).converter(Converter::Int))?;
        init.setting(SettingSpec::new("B_COUNT", "trio.b", 2).converter(Converter::Int))?;
        init.setting(SettingSpec::new("C_COUNT", "trio.c", 3).converter(Converter::Int))?;
        Ok(())
    }
}

mod discovery_tests {
    use super::*;

    #[derive(Default)]
    struct DocumentProcessorSettings;

    impl ModuleDefinition for DocumentProcessorSettings {
        fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
            init.setting(SettingSpec::new(
                "DP_QUALITY",
                "document-processor.quality",
                "auto",
            ))?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Exploding;

    impl ModuleDefinition for Exploding {
        fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
            init.setting(SettingSpec::new("FINE", "exploding.fine", "ok"))?;
            init.setting(SettingSpec::new("BROKEN", "exploding.broken", "x").converter(Converter::Int))?;
            Ok(())
        }
    }

    #[test]
    fn unmatched_type_name_falls_back_to_first_module() {
        let (store, _) = setup_store();
        let unit = CategoryUnit::new("document-processor_config")
            .abstract_base("CategoryBase")
            .module::<DocumentProcessorSettings>();

        let registry = Registry::discover(vec![unit], &context(store));
        let module = registry.category("document-processor").unwrap();
        assert_eq!(module.type_name(), "DocumentProcessorSettings");
        assert_eq!(registry.value("DP_QUALITY").unwrap(), Variant::from("auto"));
    }

    #[test]
    fn failing_units_do_not_stop_others() {
        let (store, _) = setup_store();
        let units = vec![
            CategoryUnit::new("exploding_config").module::<Exploding>(),
            CategoryUnit::new("no_module_config").other("Helper"),
            CategoryUnit::new("trio_config").module::<ThreeSettings>(),
        ];

        let registry = Registry::discover(units, &context(store));
        assert_eq!(registry.category_names(), vec!["trio"]);
        assert_eq!(registry.entry_count(), 3);

        let skipped: Vec<&str> = registry.skipped().iter().map(|s| s.unit.as_str()).collect();
        assert_eq!(skipped, vec!["exploding_config", "no_module_config"]);
        assert!(registry.get_by_name("FINE").is_err());
    }

    #[test]
    fn builtin_units_share_one_store() {
        let (store, _) = setup_store();
        let registry = Registry::discover(builtin_units(), &context(store.clone()));

        assert!(registry.skipped().is_empty());
        assert_eq!(registry.category("vllm").unwrap().type_name(), "VLLMModule");
        assert_eq!(store.value("vast.vllm.port"), Some(Variant::Int(12434)));
        assert_eq!(store.value("app.debug_mode"), Some(Variant::Bool(true)));
        // embedding declares a path under the vectordb category
        assert!(
            store
                .list_category_records("vectordb")
                .iter()
                .any(|r| r.path == "vectordb.embedding.auto_detect_dimension")
        );
    }
}

mod operation_tests {
    use super::*;

    #[test]
    fn update_returns_converted_new_and_prior_old() {
        let (store, _) = setup_store();
        let registry = Registry::discover(builtin_units(), &context(store.clone()));

        let first = registry.update("PORT", "8010").unwrap();
        assert_eq!(first.old_value, Variant::Int(8000));
        assert_eq!(first.new_value, Variant::Int(8010));

        let second = registry.update("PORT", 8020).unwrap();
        assert_eq!(second.old_value, Variant::Int(8010));
        assert_eq!(store.value("app.port"), Some(Variant::Int(8020)));
    }

    #[test]
    fn non_finite_update_is_rejected_and_value_survives() {
        let (store, _) = setup_store();
        let registry = Registry::discover(builtin_units(), &context(store.clone()));

        for raw in ["inf", "-inf", "NaN"] {
            let err = registry.update("VAST_MAX_PRICE", raw).unwrap_err();
            assert_eq!(err.code, ErrorCode::TypeConversionFailure, "{raw}");
        }
        assert_eq!(registry.value("VAST_MAX_PRICE").unwrap(), Variant::Float(1.0));
        assert!(!registry.refresh_all().failed.contains_key("VAST_MAX_PRICE"));

        registry.update("VAST_MAX_PRICE", "2.5").unwrap();
        let reopened = Registry::discover(builtin_units(), &context(store));
        assert_eq!(reopened.value("VAST_MAX_PRICE").unwrap(), Variant::Float(2.5));
    }

    #[test]
    fn update_failures_map_to_response_classes() {
        let (store, backend) = setup_store();
        let registry = Registry::discover(builtin_units(), &context(store));

        let missing = registry.update("NO_SUCH_SETTING", 1).unwrap_err();
        assert_eq!(missing.response_class(), ResponseClass::MissingConfiguration);

        let bad = registry.update("PORT", "eighty").unwrap_err();
        assert_eq!(bad.code, ErrorCode::TypeConversionFailure);
        assert_eq!(bad.response_class(), ResponseClass::BadValue);

        backend.set_read_only(true);
        let write: ConfigError = registry.update("PORT", 9000).unwrap_err();
        assert_eq!(write.code, ErrorCode::StoreWriteFailure);
        assert_eq!(write.response_class(), ResponseClass::BadValue);
        assert_eq!(registry.value("PORT").unwrap(), Variant::Int(8000));
    }

    #[test]
    fn refresh_all_continues_past_a_failure() {
        let (store, _) = setup_store();
        let unit = CategoryUnit::new("trio_config").module::<ThreeSettings>();
        let registry = Registry::discover(vec![unit], &context(store.clone()));

        store.set_record("trio.a", &Variant::from("not a number"), None, None);
        store.set_record("trio.b", &Variant::Int(20), None, None);
        store.set_record("trio.c", &Variant::Int(30), None, None);

        let report = registry.refresh_all();
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed.contains_key("A_COUNT"));
        assert_eq!(report.refreshed, vec!["B_COUNT", "C_COUNT"]);

        assert_eq!(registry.value("A_COUNT").unwrap(), Variant::Int(1));
        assert_eq!(registry.value("B_COUNT").unwrap(), Variant::Int(20));
        assert_eq!(registry.value("C_COUNT").unwrap(), Variant::Int(30));
    }

    #[test]
    fn summary_does_not_touch_the_store() {
        let (store, backend) = setup_store();
        let registry = Registry::discover(builtin_units(), &context(store));

        // a summary must work from caches alone
        backend.set_unavailable(true);
        let summary = registry.summary();
        assert_eq!(summary.total_entries, registry.entry_count());

        let port = &summary.categories["app"].entries["PORT"];
        assert_eq!(port.current_value, Variant::Int(8000));
        assert_eq!(port.default_value, Variant::Int(8000));
        assert_eq!(port.path, "app.port");
    }

    #[test]
    fn path_update_is_seen_after_refresh() {
        let (store, _) = setup_store();
        let registry = Registry::discover(builtin_units(), &context(store));

        assert!(registry.update_path("app.environment", &Variant::from("production"), None));
        assert_eq!(registry.value("ENVIRONMENT").unwrap(), Variant::from("development"));

        registry.refresh_all();
        assert_eq!(registry.value("ENVIRONMENT").unwrap(), Variant::from("production"));

        let values = registry.values_for(&["app.environment", "app.missing"]);
        assert_eq!(values["app.environment"], Some(Variant::from("production")));
        assert_eq!(values["app.missing"], None);
    }
}

mod tier_tests {
    use super::*;

    fn registry_with(env: StaticEnv, secrets: &TempDir, store: ValueStore) -> Registry {
        let ctx = ModuleContext::new(store)
            .with_env(env)
            .with_sidecar_dir(secrets.path());
        Registry::discover(builtin_units(), &ctx)
    }

    #[test]
    fn environment_then_sidecar_then_default() {
        let secrets = TempDir::new().unwrap();
        std::fs::write(secrets.path().join("openai_api_key.txt"), "  sk-from-file \n").unwrap();
        std::fs::write(secrets.path().join("anthropic_api_key.txt"), "sk-ant-file").unwrap();

        let env = StaticEnv::from([("ANTHROPIC_API_KEY", "sk-ant-env"), ("PORT", "not-a-port")]);
        let (store, _) = setup_store();
        let registry = registry_with(env, &secrets, store);

        assert_eq!(registry.value("OPENAI_API_KEY").unwrap(), Variant::from("sk-from-file"));
        assert_eq!(registry.value("ANTHROPIC_API_KEY").unwrap(), Variant::from("sk-ant-env"));
        assert_eq!(registry.value("GEMINI_API_KEY").unwrap(), Variant::from(""));
        // unconvertible environment value falls through to the default
        assert_eq!(registry.value("PORT").unwrap(), Variant::Int(8000));
    }

    #[test]
    fn stored_value_beats_every_tier() {
        let secrets = TempDir::new().unwrap();
        let (store, _) = setup_store();
        store.set_record("app.port", &Variant::Int(7100), None, None);

        let registry = registry_with(StaticEnv::from([("PORT", "9100")]), &secrets, store);
        let entry = registry.get_by_name("PORT").unwrap();
        assert_eq!(entry.value(), Variant::Int(7100));
        assert_eq!(entry.fallback(), &Variant::Int(9100));
    }

    #[test]
    fn json_map_from_environment() {
        let secrets = TempDir::new().unwrap();
        let env = StaticEnv::from([("AVAILABLE_EMBEDDING_LIST", r#"{"bge": {"dim": 1024}}"#)]);
        let (store, _) = setup_store();
        let registry = registry_with(env, &secrets, store);

        let list = registry.value("AVAILABLE_EMBEDDING_LIST").unwrap();
        assert_eq!(list.as_map().unwrap()["bge"].as_map().unwrap()["dim"], Variant::Int(1024));
    }
}
