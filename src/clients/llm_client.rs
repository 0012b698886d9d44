//! LLM API 客户端
//!
//! 封装单个 OpenAI 兼容端点的调用逻辑
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如智谱、阿里云、Doubao、Gemini 兼容端点等）

use crate::config::{Config, ProviderConfig};
use crate::error::{AppError, AppResult, LlmError};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use std::time::Duration;
use tracing::{debug, warn};

/// 请求参数（来自配置文件的全局设置）
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Option<Duration>,
}

impl ChatOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            system_prompt: Some(config.system_prompt.clone()).filter(|s| !s.trim().is_empty()),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            timeout: Some(Duration::from_secs(config.request_timeout_secs))
                .filter(|d| !d.is_zero()),
        }
    }
}

/// LLM 客户端
///
/// 职责：
/// - 调用一个厂商的 chat completion 接口
/// - 只处理单条 prompt
/// - 不认识批次，不关心并发
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    provider_id: String,
    options: ChatOptions,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(provider_id: impl Into<String>, provider: &ProviderConfig, options: ChatOptions) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&provider.api_key)
            .with_api_base(&provider.base_url);

        Self {
            client: Client::with_config(openai_config),
            provider_id: provider_id.into(),
            options,
        }
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// 发送聊天请求
    ///
    /// # 参数
    /// - `model`: 模型名称
    /// - `user_message`: 用户消息内容
    ///
    /// # 返回
    /// 返回 LLM 的响应内容；没有内容或内容为空都视为失败
    pub async fn chat(&self, model: &str, user_message: &str) -> AppResult<String> {
        debug!("调用 LLM API，厂商: {}，模型: {}", self.provider_id, model);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let request = self.build_request(model, user_message)?;

        let chat = self.client.chat();
        let call = chat.create(request);
        let response = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                warn!("LLM API 调用超时: {}/{}", self.provider_id, model);
                LlmError::Timeout {
                    provider: self.provider_id.clone(),
                    model: model.to_string(),
                    secs: limit.as_secs(),
                }
            })?,
            None => call.await,
        }
        .map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.provider_id, model, e)
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: model.to_string(),
            })?;

        Ok(content)
    }

    fn build_request(
        &self,
        model: &str,
        user_message: &str,
    ) -> AppResult<async_openai::types::chat::CreateChatCompletionRequest> {
        let build_failed = |e: OpenAIError| AppError::llm_api_failed(&self.provider_id, model, e);

        let mut messages = Vec::new();

        // 添加系统消息（如果配置了）
        if let Some(sys_msg) = &self.options.system_prompt {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg.as_str())
                .build()
                .map_err(build_failed)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(build_failed)?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        // 可选参数只在显式配置时才设置
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(model).messages(messages);
        if let Some(t) = self.options.temperature {
            args.temperature(t);
        }
        if let Some(p) = self.options.top_p {
            args.top_p(p);
        }
        if let Some(m) = self.options.max_tokens {
            args.max_tokens(m);
        }

        args.build().map_err(build_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_provider() -> ProviderConfig {
        ProviderConfig {
            base_url: "http://127.0.0.1:9/v1".to_string(),
            api_key: "sk-test".to_string(),
            models: vec!["glm-4.5".to_string()],
        }
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        let options = ChatOptions::from_config(&config);
        assert!(options.system_prompt.is_none());
        assert_eq!(options.max_tokens, Some(32000));
        assert_eq!(options.timeout, Some(Duration::from_secs(900)));

        config.system_prompt = "你是一个小说分析助手".to_string();
        config.request_timeout_secs = 0;
        let options = ChatOptions::from_config(&config);
        assert_eq!(options.system_prompt.as_deref(), Some("你是一个小说分析助手"));
        assert!(options.timeout.is_none());
    }

    #[test]
    fn test_build_request_with_system_prompt() {
        let options = ChatOptions {
            system_prompt: Some("系统".to_string()),
            temperature: Some(0.3),
            ..Default::default()
        };
        let client = LlmClient::new("zhipu", &test_provider(), options);
        let request = client.build_request("glm-4.5", "你好").unwrap();
        assert_eq!(request.model, "glm-4.5");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.temperature, Some(0.3));
    }

    /// 需要真实的 API 端点，手动运行：cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_chat_live() {
        let _ = tracing_subscriber::fmt::try_init();
        let path = std::env::var("LLM_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let config = Config::load(std::path::Path::new(&path)).await.unwrap();
        let provider_id = config.default_provider.clone().expect("需要 LLM_DEFAULT_PROVIDER");
        let model = config.default_model.clone().expect("需要 LLM_DEFAULT_MODEL");
        let provider = config.provider(&provider_id).unwrap();
        let client = LlmClient::new(&provider_id, provider, ChatOptions::from_config(&config));
        let response = client.chat(&model, "你好").await.unwrap();
        assert!(!response.is_empty());
    }
}
