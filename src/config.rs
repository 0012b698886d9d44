use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Semaphore;

/// Prompt 模板中的占位符
pub const INPUT_PLACEHOLDER: &str = "{input_content}";

/// 单个 LLM 厂商配置
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI 兼容接口地址
    pub base_url: String,
    pub api_key: String,
    /// 该厂商下可选的模型（仅用于展示和校验默认模型）
    #[serde(default)]
    pub models: Vec<String>,
}

/// LLM 配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 厂商表，键为厂商 ID（如 zhipu、aliyun）
    pub providers: BTreeMap<String, ProviderConfig>,
    pub default_provider: Option<String>,
    pub default_model: Option<String>,
    /// 系统提示词，为空时不发送
    pub system_prompt: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    /// 单次 LLM 请求超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: BTreeMap::new(),
            default_provider: None,
            default_model: None,
            system_prompt: String::new(),
            temperature: None,
            top_p: None,
            max_tokens: Some(32000),
            request_timeout_secs: 900,
        }
    }
}

impl Config {
    /// 从 TOML 文件加载配置，再叠加环境变量
    pub async fn load(path: &Path) -> AppResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| crate::error::AppError::file_read_failed(path, source))?;
        let config = Self::from_toml_str(&content, path)?;
        Ok(config.apply_env()?)
    }

    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 默认配置叠加环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// 用 `LLM_*` 环境变量覆盖对应字段
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(v) = std::env::var("LLM_DEFAULT_PROVIDER") {
            self.default_provider = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_DEFAULT_MODEL") {
            self.default_model = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_SYSTEM_PROMPT") {
            self.system_prompt = v;
        }
        if let Ok(v) = std::env::var("LLM_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v.parse().map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: "LLM_REQUEST_TIMEOUT_SECS".to_string(),
                value: v.clone(),
                expected_type: "u64",
            })?;
        }
        // 单个厂商的密钥可通过 LLM_API_KEY_<厂商ID大写> 注入，避免写进配置文件
        for (id, provider) in self.providers.iter_mut() {
            let var_name = format!("LLM_API_KEY_{}", id.to_uppercase());
            if let Ok(v) = std::env::var(&var_name) {
                provider.api_key = v;
            }
        }
        Ok(self)
    }

    pub fn provider(&self, provider_id: &str) -> Result<&ProviderConfig, ConfigError> {
        self.providers
            .get(provider_id)
            .ok_or_else(|| ConfigError::UnknownProvider {
                provider: provider_id.to_string(),
            })
    }

    /// 决定本次使用的厂商和模型，命令行优先，其次配置文件默认值
    pub fn resolve_selection(
        &self,
        provider: Option<String>,
        model: Option<String>,
    ) -> Result<(String, String), ConfigError> {
        let provider = provider
            .or_else(|| self.default_provider.clone())
            .ok_or(ConfigError::MissingSelection { what: "厂商" })?;
        self.provider(&provider)?;
        let model = model
            .or_else(|| self.default_model.clone())
            .ok_or(ConfigError::MissingSelection { what: "模型" })?;
        Ok((provider, model))
    }
}

/// 单次批量查询的运行参数
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// 章节 txt 所在目录
    pub input_dir: PathBuf,
    /// 结果输出目录
    pub output_dir: PathBuf,
    pub provider_id: String,
    pub model_id: String,
    /// 同时进行中的批次上限
    pub concurrency: usize,
    /// 每个批次包含的章节数
    pub batch_size: usize,
    pub prompt_path: PathBuf,
    /// 输出文件名前缀
    pub name_prefix: String,
    /// 起始位置（从 1 开始，含）
    pub start_pos: Option<usize>,
    /// 终止位置（含）
    pub end_pos: Option<usize>,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if self.concurrency > Semaphore::MAX_PERMITS {
            return Err(ConfigError::ConcurrencyTooLarge {
                value: self.concurrency,
                max: Semaphore::MAX_PERMITS,
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if !self.input_dir.is_dir() {
            return Err(ConfigError::InputDirNotFound {
                path: self.input_dir.clone(),
            });
        }
        Ok(())
    }
}
