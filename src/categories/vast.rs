//! Rented GPU instances and the inference server launched on them.

use crate::convert::Converter;
use crate::error::ConfigResult;
use crate::module::{CategoryModule, Initializer, ModuleDefinition, SettingSpec};
use crate::types::Variant;
use tracing::{info, warn};

const DEFAULT_PORTS: &[i64] = &[1111, 6006, 8080, 8384, 72299, 12434, 12435];
const DEFAULT_TRAIN_PORTS: &[i64] = &[1111, 6006, 8080, 8384, 72299, 8010];

const SEARCH_QUERY: &str = "gpu_name=A100_SXM4 cuda_max_good=12.8 num_gpus=1 \
                            inet_down>=5000 inet_up>=5000 disk_space>=200";

fn ports(list: &[i64]) -> Variant {
    Variant::List(list.iter().copied().map(Variant::Int).collect())
}

#[derive(Debug, Default)]
pub struct VastModule;

impl ModuleDefinition for VastModule {
    fn initialize(&self, init: &mut Initializer<'_>) -> ConfigResult<()> {
        use Converter::{Bool, Float, Int, IntList, Str};

        let settings = [
            SettingSpec::new("VAST_API_KEY", "vast.api_key", "").file("vast_api_key.txt"),
            SettingSpec::new("VAST_IMAGE_NAME", "vast.image.name", "vllm/vllm-openai"),
            SettingSpec::new("VAST_IMAGE_TAG", "vast.image.tag", "v0.10.2"),
            SettingSpec::new("VAST_TRAIN_IMAGE_NAME", "vast.train.image.name", ""),
            SettingSpec::new("VAST_TRAIN_IMAGE_TAG", "vast.train.image.tag", ""),
            // resource limits
            SettingSpec::new("VAST_MAX_PRICE", "vast.resource.max_price", "1.0").converter(Float),
            SettingSpec::new("VAST_DISK_SIZE", "vast.resource.disk_size_gb", "256").converter(Int),
            SettingSpec::new("VAST_MIN_GPU_RAM", "vast.resource.min_gpu_ram", "8").converter(Int),
            SettingSpec::new("VAST_MIN_DISK", "vast.resource.min_disk", "200").converter(Int),
            SettingSpec::new("VAST_SEARCH_QUERY", "vast.search.query", SEARCH_QUERY),
            SettingSpec::new("VAST_DEFAULT_PORTS", "vast.network.default_ports", ports(DEFAULT_PORTS))
                .converter(IntList),
            SettingSpec::new(
                "VAST_DEFAULT_TRAIN_PORTS",
                "vast.network.default_train_ports",
                ports(DEFAULT_TRAIN_PORTS),
            )
            .converter(IntList),
            // inference server
            SettingSpec::new("VLLM_HOST_IP", "vast.vllm.host_ip", "0.0.0.0"),
            SettingSpec::new("VLLM_PORT", "vast.vllm.port", "12434").converter(Int),
            SettingSpec::new("VLLM_CONTROLLER_PORT", "vast.vllm.controller_port", "12435").converter(Int),
            SettingSpec::new("VLLM_SERVE_MODEL_NAME", "vast.vllm.serve_model_name", "Qwen/Qwen3-4B")
                .converter(Str),
            SettingSpec::new("VLLM_MAX_MODEL_LEN", "vast.vllm.max_model_len", "2048").converter(Int),
            SettingSpec::new(
                "VLLM_GPU_MEMORY_UTILIZATION",
                "vast.vllm.gpu_memory_utilization",
                "0.5",
            )
            .converter(Float),
            SettingSpec::new(
                "VLLM_PIPELINE_PARALLEL_SIZE",
                "vast.vllm.pipeline_parallel_size",
                "1",
            )
            .converter(Int),
            SettingSpec::new("VLLM_TENSOR_PARALLEL_SIZE", "vast.vllm.tensor_parallel_size", "1")
                .converter(Int),
            SettingSpec::new("VLLM_DTYPE", "vast.vllm.dtype", "bfloat16").converter(Str),
            SettingSpec::new("VLLM_TOOL_CALL_PARSER", "vast.vllm.tool_call_parser", "hermes").converter(Str),
            // instance lifecycle
            SettingSpec::new("VAST_DEBUG", "vast.debug", "false").converter(Bool),
            SettingSpec::new("VAST_AUTO_DESTROY", "vast.auto_destroy", "false").converter(Bool),
            SettingSpec::new("VAST_TIMEOUT", "vast.timeout", "600").converter(Int),
            SettingSpec::new("VAST_PROXY_MODE", "vast.proxy.mode", "proxy").converter(Str),
            SettingSpec::new("VAST_PROXY_BASE_URL", "vast.proxy.base_url", "http://vast-proxy:8024")
                .converter(Str),
            SettingSpec::new("VAST_PROXY_TIMEOUT", "vast.proxy.timeout", "300").converter(Int),
            SettingSpec::new("VAST_PROXY_API_TOKEN", "vast.proxy.api_token", ""),
            SettingSpec::new("VAST_ONSTART_SCRIPT", "vast.onstart.script", ""),
        ];

        for spec in settings {
            init.setting(spec)?;
        }
        Ok(())
    }

    fn after_initialize(&self, module: &CategoryModule) -> ConfigResult<()> {
        if module.get("VAST_API_KEY")?.value().is_blank() {
            warn!("Vast API key not configured");
        } else {
            info!("Vast API key configured");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::StaticEnv;
    use crate::module::ModuleContext;
    use crate::store::ValueStore;

    #[test]
    fn test_string_defaults_are_typed() {
        let ctx = ModuleContext::new(ValueStore::in_memory()).with_env(StaticEnv::new());
        let module = CategoryModule::build("vast", "VastModule", &VastModule, &ctx).unwrap();

        assert_eq!(module.get("VLLM_PORT").unwrap().value(), Variant::Int(12434));
        assert_eq!(module.get("VAST_MAX_PRICE").unwrap().value(), Variant::Float(1.0));
        assert_eq!(module.get("VAST_DEBUG").unwrap().value(), Variant::Bool(false));
        assert_eq!(
            module.get("VAST_DEFAULT_TRAIN_PORTS").unwrap().value(),
            ports(DEFAULT_TRAIN_PORTS)
        );
    }

    #[test]
    fn test_ports_from_environment() {
        let env = StaticEnv::from([("VAST_DEFAULT_PORTS", "22, 8080,abc")]);
        let ctx = ModuleContext::new(ValueStore::in_memory()).with_env(env);
        let module = CategoryModule::build("vast", "VastModule", &VastModule, &ctx).unwrap();

        assert_eq!(
            module.get("VAST_DEFAULT_PORTS").unwrap().value(),
            Variant::List(vec![Variant::Int(22), Variant::Int(8080)])
        );
    }
}
