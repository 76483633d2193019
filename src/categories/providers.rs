//! Model provider endpoints and credentials.

use crate::convert::Converter;
use crate::error::ConfigResult;
use crate::module::{Initializer, ModuleDefinition, SettingSpec};

struct HostedProvider {
    env_prefix: &'static str,
    model: &'static str,
    base_url: &'static str,
}

impl HostedProvider {
    /// The six settings every hosted provider shares. The API key may come
    /// from `<category>_api_key.txt`.
    fn declare(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        let category = init.category().to_string();
        let env = |name: &str| format!("{}_{name}", self.env_prefix);
        let path = |name: &str| format!("{category}.{name}");

        init.setting(
            SettingSpec::new(env("API_KEY"), path("api_key"), "")
                .file(format!("{category}_api_key.txt")),
        )?;
        init.setting(SettingSpec::new(env("MODEL_DEFAULT"), path("model_default"), self.model))?;
        init.setting(SettingSpec::new(env("API_BASE_URL"), path("api_base_url"), self.base_url))?;
        init.setting(
            SettingSpec::new(env("TEMPERATURE_DEFAULT"), path("temperature_default"), 0.7)
                .converter(Converter::Float),
        )?;
        init.setting(
            SettingSpec::new(env("MAX_TOKENS_DEFAULT"), path("max_tokens_default"), 1000)
                .converter(Converter::Int),
        )?;
        init.setting(
            SettingSpec::new(env("REQUEST_TIMEOUT"), path("request_timeout"), 30)
                .converter(Converter::Int),
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct OpenaiModule;

impl ModuleDefinition for OpenaiModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        HostedProvider {
            env_prefix: "OPENAI",
            model: "gpt-4o",
            base_url: "https://api.openai.com/v1",
        }
        .declare(init)
    }
}

#[derive(Debug, Default)]
pub struct AnthropicModule;

impl ModuleDefinition for AnthropicModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        HostedProvider {
            env_prefix: "ANTHROPIC",
            model: "claude-sonnet-4-20250514",
            base_url: "https://api.anthropic.com",
        }
        .declare(init)
    }
}

#[derive(Debug, Default)]
pub struct GeminiModule;

impl ModuleDefinition for GeminiModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        HostedProvider {
            env_prefix: "GEMINI",
            model: "gemini-2.5-flash",
            base_url: "https://generativelanguage.googleapis.com/v1beta",
        }
        .declare(init)
    }
}

/// Self-hosted OpenAI-compatible server.
#[derive(Debug, Default)]
pub struct VLLMModule;

impl ModuleDefinition for VLLMModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        init.setting(SettingSpec::new(
            "VLLM_API_BASE_URL",
            "vllm.api_base_url",
            "http://localhost:12721/v1",
        ))?;
        init.setting(
            SettingSpec::new("VLLM_API_KEY", "vllm.api_key", "").file("vllm_api_key.txt"),
        )?;
        init.setting(SettingSpec::new("VLLM_MODEL_NAME", "vllm.model_name", "Qwen/Qwen3-4B"))?;
        Ok(())
    }
}

/// Provider selection across the modules above.
#[derive(Debug, Default)]
pub struct LlmModule;

impl ModuleDefinition for LlmModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        init.setting(SettingSpec::new("DEFAULT_LLM_PROVIDER", "llm.default_provider", "openai"))?;
        init.setting(
            SettingSpec::new("LLM_AUTO_FALLBACK", "llm.auto_fallback", true).converter(Converter::Bool),
        )?;
        init.setting(
            SettingSpec::new("LLM_CONNECTION_TIMEOUT", "llm.connection_timeout", 10)
                .converter(Converter::Int),
        )?;
        init.setting(
            SettingSpec::new("LLM_MAX_RETRIES", "llm.max_retries", 3).converter(Converter::Int),
        )?;
        Ok(())
    }
}
