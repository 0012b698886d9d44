//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次批量查询的规划与调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `planner` - 批次规划
//! - 把有序章节列表切分成编号连续的批次（纯函数）
//!
//! ### `batch_processor` - 批量查询处理器
//! - 枚举章节、规划批次、扣除已完成批次
//! - 持有中止闸门和并发许可池
//! - 按批次号顺序派发，独立收集每个批次的结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Batch>)
//!     ↓
//! workflow::BatchFlow (处理单个 Batch)
//!     ↓
//! services (能力层：prompt / llm / resume / writer)
//!     ↓
//! infrastructure (基础设施：PermitPool / CancellationGate)
//! ```

pub mod batch_processor;
pub mod planner;

// 重新导出主要类型
pub use batch_processor::QueryRunner;
pub use planner::{batch_count, plan_batches};
