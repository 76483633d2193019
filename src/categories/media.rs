//! Speech and guard models.

use super::JSON_MAP;
use crate::convert::Converter;
use crate::error::ConfigResult;
use crate::module::{Initializer, ModuleDefinition, SettingSpec};
use crate::types::Variant;
use std::collections::BTreeMap;

fn empty_map() -> BTreeMap<String, Variant> {
    BTreeMap::new()
}

#[derive(Debug, Default)]
pub struct TTSModule;

impl ModuleDefinition for TTSModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        init.setting(
            SettingSpec::new("IS_AVAILABLE_TTS", "tts.is_available_tts", false).converter(Converter::Bool),
        )?;
        init.setting(
            SettingSpec::new("AVAILABLE_TTS_LIST", "tts.available_tts_list", empty_map())
                .converter(JSON_MAP),
        )?;
        init.setting(SettingSpec::new("TTS_PROVIDER", "tts.provider", "zonos"))?;
        init.setting(SettingSpec::new("OPENAI_TTS_MODEL_NAME", "tts.openai.model_name", "tts-1"))?;
        init.setting(SettingSpec::new(
            "ZONOS_TTS_MODEL_NAME",
            "tts.zonos.model_name",
            "Zyphra/Zonos-v0.1-transformer",
        ))?;
        init.setting(SettingSpec::new("ZONOS_TTS_MODEL_DEVICE", "tts.zonos.model_device", "gpu"))?;
        init.setting(SettingSpec::new(
            "ZONOS_TTS_DEFAULT_SPEAKER",
            "tts.zonos.default_speaker",
            "female_sample3",
        ))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct STTModule;

impl ModuleDefinition for STTModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        init.setting(
            SettingSpec::new("IS_AVAILABLE_STT", "stt.is_available_stt", false).converter(Converter::Bool),
        )?;
        init.setting(
            SettingSpec::new("AVAILABLE_STT_LIST", "stt.available_stt_list", empty_map())
                .converter(JSON_MAP),
        )?;
        init.setting(SettingSpec::new("STT_PROVIDER", "stt.provider", "huggingface"))?;
        init.setting(SettingSpec::new("OPENAI_STT_MODEL_NAME", "stt.openai.model_name", "whisper-1"))?;
        init.setting(SettingSpec::new(
            "HUGGINGFACE_STT_MODEL_NAME",
            "stt.huggingface.model_name",
            "openai/whisper-small",
        ))?;
        init.setting(SettingSpec::new(
            "HUGGINGFACE_STT_MODEL_DEVICE",
            "stt.huggingface.model_device",
            "cpu",
        ))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct GuarderModule;

impl ModuleDefinition for GuarderModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        init.setting(
            SettingSpec::new("IS_AVAILABLE_GUARDER", "guarder.is_available_guarder", false)
                .converter(Converter::Bool),
        )?;
        init.setting(
            SettingSpec::new("GUARDER_RIGOROUS_FILTER", "guarder.rigorous_filter", false)
                .converter(Converter::Bool),
        )?;
        init.setting(SettingSpec::new("GUARDER_PROVIDER", "guarder.provider", "qwen3guard"))?;
        init.setting(SettingSpec::new(
            "QWEN3GUARD_MODEL_NAME",
            "guarder.qwen3guard.model_name",
            "Qwen/Qwen3Guard-Gen-0.6B",
        ))?;
        init.setting(SettingSpec::new(
            "QWEN3GUARD_MODEL_DEVICE",
            "guarder.qwen3guard.model_device",
            "cpu",
        ))?;
        Ok(())
    }
}
