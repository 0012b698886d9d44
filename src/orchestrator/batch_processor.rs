//! 批量查询处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是一次批量查询运行的入口，负责批次的规划、派发和结果汇总。
//!
//! ## 核心流程
//!
//! 1. **配置检查**：校验参数、读取 Prompt 模板（失败直接终止，不派发任何批次）
//! 2. **枚举章节**：扫描输入目录并按位置范围过滤
//! 3. **规划批次**：按批次大小切分，批次号从 1 开始
//! 4. **断点续跑**：扣除输出目录中已有结果的批次
//! 5. **并发派发**：按批次号顺序提交，用许可池限制同时进行的调用数
//! 6. **结果汇总**：每个批次独立收集结果，单个批次失败不影响其他批次
//!
//! ## 中止
//!
//! - 派发前已中止：不派发任何批次，全部记为跳过
//! - 派发中中止：尚未发起调用的批次跳过，已发起的调用自然完成
//! - 无论如何退出，运行结束时都会清除中止标志

use crate::config::RunConfig;
use crate::error::{AppResult, BatchError};
use crate::infrastructure::permit_pool::log_activity;
use crate::infrastructure::{ActivityCallback, CancellationGate, PermitPool};
use crate::models::{apply_range, scan_items, Batch, BatchOutcome, BatchReport, RunReport, RunStatus};
use crate::orchestrator::planner::plan_batches;
use crate::services::{completed_batches, ChatBackend, PromptTemplate, ResultWriter};
use crate::utils::logging::{log_batch_outcome, log_plan, log_startup, print_final_stats};
use crate::workflow::{BatchCtx, BatchFlow, ProcessResult};
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 批量查询运行器
///
/// 一个运行器对应一组运行参数，可以重复调用 [`QueryRunner::run`]，
/// 第二次运行会自动跳过第一次已完成的批次。
pub struct QueryRunner {
    config: RunConfig,
    backend: Arc<dyn ChatBackend>,
    gate: CancellationGate,
    activity: ActivityCallback,
}

impl QueryRunner {
    pub fn new(config: RunConfig, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            config,
            backend,
            gate: CancellationGate::new(),
            activity: Arc::new(log_activity),
        }
    }

    /// 替换活跃数回调（默认写日志）
    pub fn with_activity_callback(mut self, callback: ActivityCallback) -> Self {
        self.activity = callback;
        self
    }

    /// 使用外部提供的中止闸门
    pub fn with_cancellation_gate(mut self, gate: CancellationGate) -> Self {
        self.gate = gate;
        self
    }

    /// 中止句柄，可交给 UI 或信号处理器
    pub fn cancellation_gate(&self) -> CancellationGate {
        self.gate.clone()
    }

    /// 发出中止请求：尚未发起调用的批次将被跳过，已发起的不受影响
    pub fn request_cancel(&self) {
        self.gate.request_cancel();
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// 执行一次完整运行
    ///
    /// 只有配置错误会返回 `Err`；单个批次的失败体现在报告里。
    pub async fn run(&self) -> AppResult<RunReport> {
        let _clear = self.gate.clear_on_drop();
        let report = self.run_inner().await?;
        print_final_stats(&report);
        Ok(report)
    }

    async fn run_inner(&self) -> AppResult<RunReport> {
        let config = &self.config;
        config.validate()?;
        log_startup(config);

        let template = PromptTemplate::load(&config.prompt_path).await?;

        // ========== 枚举章节 ==========
        info!("\n📁 正在扫描章节文件...");
        let all_items = scan_items(&config.input_dir).await?;
        if all_items.is_empty() {
            warn!("⚠️ 在 {} 中没有找到txt文件", config.input_dir.display());
            return Ok(RunReport::no_work(0, 0));
        }
        let items = apply_range(all_items, config.start_pos, config.end_pos);

        // ========== 规划批次并扣除已完成的 ==========
        let batches = plan_batches(&items, config.batch_size);
        let total_items = items.len();
        let total_batches = batches.len();

        let done = completed_batches(&config.output_dir, &config.name_prefix, config.batch_size).await?;
        let missing: Vec<Batch> = batches
            .into_iter()
            .filter(|b| !done.contains(&b.number))
            .collect();

        if missing.is_empty() {
            info!("所有批次都已完成，无需重新处理");
            return Ok(RunReport::no_work(total_items, total_batches));
        }
        log_plan(total_items, total_batches, missing.len());

        if self.gate.is_cancelled() {
            warn!("收到中止请求，未开始创建任务，直接退出");
            let outcomes = missing
                .iter()
                .map(|b| BatchReport {
                    batch_number: b.number,
                    outcome: BatchOutcome::Skipped,
                })
                .collect();
            return Ok(RunReport {
                status: RunStatus::Cancelled,
                total_items,
                total_batches,
                outcomes,
            });
        }

        // ========== 并发派发 ==========
        let flow = Arc::new(BatchFlow::new(
            self.backend.clone(),
            template,
            ResultWriter::new(&config.output_dir, &config.name_prefix, config.batch_size),
            &config.provider_id,
            &config.model_id,
        ));
        let pool = PermitPool::with_callback(config.concurrency, self.activity.clone());

        info!(
            "开始并发处理 {} 个批次（并发数: {}）...",
            missing.len(),
            config.concurrency
        );
        let outcomes = self.dispatch(missing, total_batches, flow, pool).await;

        let status = if outcomes.iter().any(|r| r.outcome == BatchOutcome::Skipped) {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };

        Ok(RunReport {
            status,
            total_items,
            total_batches,
            outcomes,
        })
    }

    /// 按批次号顺序提交任务，等待全部结束后逐个收集结果
    async fn dispatch(
        &self,
        missing: Vec<Batch>,
        total_batches: usize,
        flow: Arc<BatchFlow>,
        pool: PermitPool,
    ) -> Vec<BatchReport> {
        let mut numbers = Vec::with_capacity(missing.len());
        let mut handles: Vec<Option<JoinHandle<AppResult<ProcessResult>>>> =
            Vec::with_capacity(missing.len());

        for batch in missing {
            numbers.push(batch.number);
            if self.gate.is_cancelled() {
                handles.push(None);
                continue;
            }

            let ctx = BatchCtx::new(batch.number, total_batches, batch.len());
            let flow = flow.clone();
            let gate = self.gate.clone();
            let pool = pool.clone();

            handles.push(Some(tokio::spawn(async move {
                flow.run(&batch.items, &ctx, &gate, &pool).await
            })));
        }

        if handles.iter().any(Option::is_none) {
            warn!("收到中止请求，停止创建剩余任务");
        }

        // 每个任务单独 await，一个批次的错误或 panic 不会影响其他批次
        let results = join_all(handles.into_iter().map(|handle| async move {
            match handle {
                Some(handle) => Some(handle.await),
                None => None,
            }
        }))
        .await;

        numbers
            .into_iter()
            .zip(results)
            .map(|(batch_number, result)| {
                let outcome = match result {
                    None | Some(Ok(Ok(ProcessResult::Skipped))) => BatchOutcome::Skipped,
                    Some(Ok(Ok(ProcessResult::Success(_)))) => BatchOutcome::Done,
                    Some(Ok(Err(e))) => BatchOutcome::Failed(e.to_string()),
                    Some(Err(join_err)) => BatchOutcome::Failed(
                        BatchError::TaskFailed {
                            batch_number,
                            reason: join_err.to_string(),
                        }
                        .to_string(),
                    ),
                };
                log_batch_outcome(batch_number, &outcome);
                BatchReport {
                    batch_number,
                    outcome,
                }
            })
            .collect()
    }
}
