use crate::convert::Converter;
use crate::error::ConfigResult;
use crate::module::{Initializer, ModuleDefinition, SettingSpec};

/// Process-level settings.
#[derive(Debug, Default)]
pub struct AppModule;

impl ModuleDefinition for AppModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        init.setting(SettingSpec::new("ENVIRONMENT", "app.environment", "development"))?;
        init.setting(SettingSpec::new("DEBUG_MODE", "app.debug_mode", true).converter(Converter::Bool))?;
        init.setting(SettingSpec::new("PORT", "app.port", 8000).converter(Converter::Int))?;
        init.setting(SettingSpec::new("HOST", "app.host", "0.0.0.0"))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct WorkflowModule;

impl ModuleDefinition for WorkflowModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        // seconds
        init.setting(
            SettingSpec::new("WORKFLOW_EXECUTION_TIMEOUT", "workflow.execution_timeout", 300)
                .converter(Converter::Int),
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NodeModule;

impl ModuleDefinition for NodeModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        init.setting(SettingSpec::new(
            "NODE_REGISTRY_FILE_PATH",
            "node.registry_file_path",
            "constants/exported_nodes.json",
        ))?;
        Ok(())
    }
}

/// Image-to-text extraction used while ingesting documents.
#[derive(Debug, Default)]
pub struct DocumentProcessorModule;

impl ModuleDefinition for DocumentProcessorModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        const P: &str = "DOCUMENT_PROCESSOR";
        let spec = |name: &str, path: &str, default: &str| {
            SettingSpec::new(format!("{P}_{name}"), format!("document_processor.{path}"), default)
        };

        init.setting(spec("IMAGE_TEXT_MODEL_PROVIDER", "image_text_model_provider", "openai"))?;
        init.setting(spec(
            "OPENAI_IMAGE_TEXT_BASE_URL",
            "openai.image_text_base_url",
            "https://api.openai.com/v1",
        ))?;
        init.setting(spec("OPENAI_IMAGE_TEXT_API_KEY", "openai.image_text_api_key", ""))?;
        init.setting(spec(
            "OPENAI_IMAGE_TEXT_MODEL_NAME",
            "openai.image_text_model_name",
            "gpt-4.1-mini",
        ))?;
        init.setting(spec("VLLM_IMAGE_TEXT_BASE_URL", "vllm.image_text_base_url", ""))?;
        init.setting(spec("VLLM_IMAGE_TEXT_API_KEY", "vllm.image_text_api_key", ""))?;
        init.setting(spec("VLLM_IMAGE_TEXT_MODEL_NAME", "vllm.image_text_model_name", ""))?;
        init.setting(
            spec("IMAGE_TEXT_TEMPERATURE", "image_text_temperature", "0.7").converter(Converter::Float),
        )?;
        init.setting(spec("IMAGE_QUALITY", "image_quality", "auto"))?;
        init.setting(
            spec("IMAGE_TEXT_BATCH_SIZE", "image_text_batch_size", "1").converter(Converter::Int),
        )?;
        Ok(())
    }
}
