//! Built-in setting categories.
//!
//! [`builtin_units`] is the registration table handed to
//! [`Registry::discover`](crate::registry::Registry::discover).

mod app;
mod media;
mod providers;
mod storage;
mod vast;

pub use app::{AppModule, DocumentProcessorModule, NodeModule, WorkflowModule};
pub use media::{GuarderModule, STTModule, TTSModule};
pub use providers::{AnthropicModule, GeminiModule, LlmModule, OpenaiModule, VLLMModule};
pub use storage::{DatabaseModule, EmbeddingModule, VectordbModule};
pub use vast::VastModule;

use crate::convert::Converter;
use crate::error::{ConfigError, ConfigResult};
use crate::registry::CategoryUnit;
use crate::types::Variant;

/// Every built-in unit, in load order.
pub fn builtin_units() -> Vec<CategoryUnit> {
    vec![
        CategoryUnit::new("app_config").module::<AppModule>(),
        CategoryUnit::new("openai_config").module::<OpenaiModule>(),
        CategoryUnit::new("anthropic_config").module::<AnthropicModule>(),
        CategoryUnit::new("gemini_config").module::<GeminiModule>(),
        CategoryUnit::new("vllm_config").module::<VLLMModule>(),
        CategoryUnit::new("llm_config").module::<LlmModule>(),
        CategoryUnit::new("database_config").module::<DatabaseModule>(),
        CategoryUnit::new("vectordb_config").module::<VectordbModule>(),
        CategoryUnit::new("embedding_config").module::<EmbeddingModule>(),
        CategoryUnit::new("tts_config").module::<TTSModule>(),
        CategoryUnit::new("stt_config").module::<STTModule>(),
        CategoryUnit::new("guarder_config").module::<GuarderModule>(),
        CategoryUnit::new("workflow_config").module::<WorkflowModule>(),
        CategoryUnit::new("node_config").module::<NodeModule>(),
        CategoryUnit::new("document_processor_config").module::<DocumentProcessorModule>(),
        CategoryUnit::new("vast_config").module::<VastModule>(),
    ]
}

/// Text holding a JSON object, or an object already.
pub(crate) const JSON_MAP: Converter = Converter::Custom("json_map", json_map);

fn json_map(raw: &Variant) -> ConfigResult<Variant> {
    match raw {
        Variant::Map(_) => Ok(raw.clone()),
        Variant::String(text) => match serde_json::from_str::<Variant>(text) {
            Ok(value @ Variant::Map(_)) => Ok(value),
            Ok(_) => Err(ConfigError::conversion("json_map", text, "not a JSON object")),
            Err(e) => Err(ConfigError::conversion("json_map", text, &e.to_string())),
        },
        other => Err(ConfigError::conversion("json_map", other, "not a JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::StaticEnv;
    use crate::module::ModuleContext;
    use crate::registry::Registry;
    use crate::store::ValueStore;

    #[test]
    fn test_all_builtins_load() {
        let ctx = ModuleContext::new(ValueStore::in_memory()).with_env(StaticEnv::new());
        let units = builtin_units();
        let count = units.len();
        let registry = Registry::discover(units, &ctx);

        assert!(registry.skipped().is_empty(), "{:?}", registry.skipped());
        assert_eq!(registry.category_names().len(), count);
        assert_eq!(
            registry.category("document_processor").unwrap().type_name(),
            "DocumentProcessorModule"
        );
    }

    #[test]
    fn test_json_map_converter() {
        let parsed = JSON_MAP.apply(&Variant::from(r#"{"small": 384}"#)).unwrap();
        assert_eq!(parsed.as_map().unwrap()["small"], Variant::Int(384));
        assert!(JSON_MAP.apply(&Variant::from("[1, 2]")).is_err());
        assert!(JSON_MAP.apply(&Variant::Int(3)).is_err());
    }
}
