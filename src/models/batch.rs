//! 批次与运行结果

use crate::models::item::Item;
use serde::Serialize;
use std::fmt;

/// 一个批次：编号从 1 开始，包含按顺序排列的章节
///
/// 每次运行都根据当前的章节列表重新计算，不做持久化。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub number: usize,
    pub items: Vec<Item>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 批次的最终结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// 结果文件已写入
    Done,
    /// 处理失败，附带错误信息
    Failed(String),
    /// 收到中止请求，未发起调用
    Skipped,
}

impl BatchOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, BatchOutcome::Done)
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOutcome::Done => write!(f, "成功"),
            BatchOutcome::Failed(reason) => write!(f, "失败: {}", reason),
            BatchOutcome::Skipped => write!(f, "已跳过"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub batch_number: usize,
    pub outcome: BatchOutcome,
}

/// 一次运行的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// 没有需要处理的批次（无文件、范围为空或全部已完成）
    NoWork,
    /// 所有待处理批次都已派发并收集结果
    Completed,
    /// 运行中收到中止请求，部分批次被跳过
    Cancelled,
}

/// 一次运行的汇总报告
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    /// 范围过滤后的章节数
    pub total_items: usize,
    /// 规划出的批次总数（含已完成的）
    pub total_batches: usize,
    /// 本次运行开始时缺失的每个批次的结果，按批次号升序
    pub outcomes: Vec<BatchReport>,
}

impl RunReport {
    pub fn no_work(total_items: usize, total_batches: usize) -> Self {
        Self {
            status: RunStatus::NoWork,
            total_items,
            total_batches,
            outcomes: Vec::new(),
        }
    }

    pub fn done(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Done))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Skipped))
    }

    pub fn outcome_of(&self, batch_number: usize) -> Option<&BatchOutcome> {
        self.outcomes
            .iter()
            .find(|r| r.batch_number == batch_number)
            .map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&BatchOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|r| pred(&r.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let report = RunReport {
            status: RunStatus::Cancelled,
            total_items: 40,
            total_batches: 4,
            outcomes: vec![
                BatchReport { batch_number: 1, outcome: BatchOutcome::Done },
                BatchReport { batch_number: 2, outcome: BatchOutcome::Failed("超时".into()) },
                BatchReport { batch_number: 3, outcome: BatchOutcome::Skipped },
                BatchReport { batch_number: 4, outcome: BatchOutcome::Skipped },
            ],
        };
        assert_eq!(report.done(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.outcome_of(3), Some(&BatchOutcome::Skipped));
        assert_eq!(report.outcome_of(9), None);
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(BatchOutcome::Failed("x".into())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "failed", "reason": "x"}));
        let json = serde_json::to_value(BatchOutcome::Done).unwrap();
        assert_eq!(json, serde_json::json!({"status": "done"}));
    }
}
