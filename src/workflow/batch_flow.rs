//! 批次处理流程 - 流程层
//!
//! 核心职责：定义"一个批次"的完整处理流程
//!
//! 流程顺序：
//! 1. 中止检查（任务刚开始）
//! 2. 读取章节 → 拼接内容 → 渲染 Prompt（不占用并发许可）
//! 3. 获取并发许可 → 中止检查 → 调用 LLM → 归还许可
//! 4. 写入结果文件

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{AppResult, BatchError};
use crate::infrastructure::{CancellationGate, PermitPool};
use crate::models::Item;
use crate::services::{build_payload, ChatBackend, PromptTemplate, ResultWriter};
use crate::utils::logging::truncate_text;
use crate::workflow::batch_ctx::BatchCtx;

/// 批次处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResult {
    /// 结果已写入
    Success(PathBuf),
    /// 收到中止请求，未发起调用
    Skipped,
}

/// 批次处理流程
///
/// - 编排单个批次从读取到落盘的步骤
/// - 决定何时检查中止、何时占用并发许可
/// - 不持有并发资源（许可池由编排层传入）
/// - 只依赖业务能力（services）
pub struct BatchFlow {
    backend: Arc<dyn ChatBackend>,
    template: PromptTemplate,
    writer: ResultWriter,
    provider_id: String,
    model_id: String,
}

impl BatchFlow {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        template: PromptTemplate,
        writer: ResultWriter,
        provider_id: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            template,
            writer,
            provider_id: provider_id.into(),
            model_id: model_id.into(),
        }
    }

    pub async fn run(
        &self,
        items: &[Item],
        ctx: &BatchCtx,
        gate: &CancellationGate,
        pool: &PermitPool,
    ) -> AppResult<ProcessResult> {
        // 尚未开始处理的批次直接跳过
        if gate.is_cancelled() {
            return Ok(ProcessResult::Skipped);
        }

        // ========== 读取并拼接章节内容 ==========
        let payload = build_payload(ctx.batch_number, items).await;
        if payload.is_empty() {
            return Err(BatchError::NoValidContent {
                batch_number: ctx.batch_number,
            }
            .into());
        }
        if payload.excluded > 0 {
            warn!(
                "{} ⚠️ {} 个章节被排除，实际使用 {}/{}",
                ctx, payload.excluded, payload.included, ctx.item_count
            );
        }

        let prompt = self.template.render(&payload.text);

        // ========== 占用许可，调用 LLM ==========
        let permit = pool.acquire(ctx.batch_number).await?;

        // 已开始的调用不会被打断；这里是发起调用前的最后一次检查
        if gate.is_cancelled() {
            info!("{} 收到中止请求，跳过", ctx);
            return Ok(ProcessResult::Skipped);
        }

        let response = self
            .backend
            .chat(&self.model_id, &self.provider_id, &prompt)
            .await;
        drop(permit);

        let content = response.map_err(|e| {
            error!("{} ❌ LLM 调用失败: {}", ctx, e);
            e
        })?;

        debug!("{} 响应预览: {}", ctx, truncate_text(&content, 80));

        // ========== 写入结果 ==========
        let path = self.writer.write(ctx.batch_number, &content).await?;
        info!("{} ✓ 成功完成，结果已保存: {}", ctx, path.display());

        Ok(ProcessResult::Success(path))
    }
}
