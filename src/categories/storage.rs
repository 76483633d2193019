use super::JSON_MAP;
use crate::convert::Converter;
use crate::error::ConfigResult;
use crate::module::{Initializer, ModuleDefinition, SettingSpec};
use crate::types::Variant;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct DatabaseModule;

impl ModuleDefinition for DatabaseModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        // "auto", "postgresql" or "sqlite"
        init.setting(SettingSpec::new("DATABASE_TYPE", "database.type", "auto"))?;
        init.setting(SettingSpec::new("POSTGRES_HOST", "database.postgres.host", "localhost"))?;
        init.setting(
            SettingSpec::new("POSTGRES_PORT", "database.postgres.port", 5432).converter(Converter::Int),
        )?;
        init.setting(SettingSpec::new("POSTGRES_DB", "database.postgres.database", "plateerag"))?;
        init.setting(SettingSpec::new("POSTGRES_USER", "database.postgres.user", ""))?;
        init.setting(
            SettingSpec::new("POSTGRES_PASSWORD", "database.postgres.password", "")
                .file("postgres_password.txt"),
        )?;
        init.setting(SettingSpec::new("SQLITE_PATH", "database.sqlite.path", "constants/config.db"))?;
        init.setting(
            SettingSpec::new("AUTO_MIGRATION", "database.auto_migration", true).converter(Converter::Bool),
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct VectordbModule;

impl ModuleDefinition for VectordbModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        init.setting(SettingSpec::new("QDRANT_HOST", "vectordb.qdrant.host", "localhost"))?;
        init.setting(
            SettingSpec::new("QDRANT_PORT", "vectordb.qdrant.port", 6333).converter(Converter::Int),
        )?;
        init.setting(
            SettingSpec::new("QDRANT_USE_GRPC", "vectordb.qdrant.use_grpc", false)
                .converter(Converter::Bool),
        )?;
        init.setting(
            SettingSpec::new("QDRANT_GRPC_PORT", "vectordb.qdrant.grpc_port", 6334)
                .converter(Converter::Int),
        )?;
        init.setting(SettingSpec::new("QDRANT_API_KEY", "vectordb.qdrant.api_key", ""))?;
        init.setting(
            SettingSpec::new("QDRANT_VECTOR_DIMENSION", "vectordb.qdrant.vector_dimension", 1536)
                .converter(Converter::Int),
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct EmbeddingModule;

impl ModuleDefinition for EmbeddingModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        init.setting(
            SettingSpec::new(
                "AVAILABLE_EMBEDDING_LIST",
                "embedding.available_embedding_list",
                BTreeMap::<String, Variant>::new(),
            )
            .converter(JSON_MAP),
        )?;
        init.setting(SettingSpec::new("EMBEDDING_PROVIDER", "embedding.provider", "huggingface"))?;
        init.setting(SettingSpec::new(
            "OPENAI_EMBEDDING_MODEL_NAME",
            "embedding.openai.model_name",
            "text-embedding-3-small",
        ))?;
        init.setting(SettingSpec::new(
            "HUGGINGFACE_EMBEDDING_MODEL_NAME",
            "embedding.huggingface.model_name",
            "Qwen/Qwen3-Embedding-0.6B",
        ))?;
        init.setting(SettingSpec::new(
            "HUGGINGFACE_EMBEDDING_MODEL_DEVICE",
            "embedding.huggingface.model_device",
            "cpu",
        ))?;
        init.setting(SettingSpec::new(
            "CUSTOM_EMBEDDING_URL",
            "embedding.custom.url",
            "http://localhost:8000/v1",
        ))?;
        init.setting(SettingSpec::new("CUSTOM_EMBEDDING_API_KEY", "embedding.custom.api_key", ""))?;
        init.setting(SettingSpec::new(
            "CUSTOM_EMBEDDING_MODEL_NAME",
            "embedding.custom.model_name",
            "",
        ))?;
        // Stored under the vectordb category, so it shows up in that category's views.
        init.setting(
            SettingSpec::new(
                "AUTO_DETECT_EMBEDDING_DIM",
                "vectordb.embedding.auto_detect_dimension",
                true,
            )
            .converter(Converter::Bool),
        )?;
        Ok(())
    }
}
