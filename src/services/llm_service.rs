//! LLM 服务 - 业务能力层
//!
//! 只负责"把一条 prompt 交给指定厂商的模型"这一能力，不关心批次和流程

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

use crate::clients::{ChatOptions, LlmClient};
use crate::config::Config;
use crate::error::{AppResult, LlmError};

/// 外部 LLM 调用能力
///
/// 编排层只依赖这个 trait；任何错误或空响应都被视为该批次失败。
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, model_id: &str, provider_id: &str, prompt: &str) -> AppResult<String>;
}

/// 统一模型路由
///
/// 按厂商 ID 选择对应的客户端，客户端在构造时一次性创建并复用。
pub struct ModelRouter {
    clients: HashMap<String, LlmClient>,
}

impl ModelRouter {
    pub fn new(config: &Config) -> Self {
        let options = ChatOptions::from_config(config);
        let clients = config
            .providers
            .iter()
            .map(|(id, provider)| (id.clone(), LlmClient::new(id, provider, options.clone())))
            .collect();
        Self { clients }
    }

    pub fn has_provider(&self, provider_id: &str) -> bool {
        self.clients.contains_key(provider_id)
    }
}

#[async_trait]
impl ChatBackend for ModelRouter {
    async fn chat(&self, model_id: &str, provider_id: &str, prompt: &str) -> AppResult<String> {
        let client = self
            .clients
            .get(provider_id)
            .ok_or_else(|| LlmError::UnknownProvider {
                provider: provider_id.to_string(),
            })?;
        debug!("路由到厂商 {}", client.provider_id());
        client.chat(model_id, prompt).await
    }
}
