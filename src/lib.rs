//! # Chapter Query
//!
//! 用 LLM 对小说章节文件进行批量 Query-Answer 处理，支持并发控制、断点续跑和中途中止
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有并发资源，只暴露能力
//! - `PermitPool` - 并发许可池，维护活跃计数
//! - `CancellationGate` - 协作式中止标志
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个批次或单条 prompt
//! - `ModelRouter` - 按厂商路由的 LLM 调用能力
//! - `PromptTemplate` / `build_payload` - Prompt 组装能力
//! - `ResultWriter` / `completed_batches` - 结果落盘与断点续跑
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个批次"的完整处理流程
//! - `BatchCtx` - 上下文封装（批次号 / 批次总数）
//! - `BatchFlow` - 流程编排（读取 → 拼接 → 许可 → 调用 → 写入）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/planner` - 批次规划
//! - `orchestrator/batch_processor` - 一次运行的枚举、续跑过滤、并发派发与汇总
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, RunConfig};
pub use error::{AppError, AppResult};
pub use infrastructure::{CancellationGate, PermitPool};
pub use models::{Batch, BatchOutcome, BatchReport, Item, RunReport, RunStatus};
pub use orchestrator::QueryRunner;
pub use services::{ChatBackend, ModelRouter};
pub use workflow::{BatchCtx, BatchFlow, ProcessResult};
