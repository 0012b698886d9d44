//! 批次处理上下文
//!
//! 封装"我正在处理第几个批次"这一信息

use std::fmt::Display;

/// 批次处理上下文（仅用于日志）
#[derive(Debug, Clone, Copy)]
pub struct BatchCtx {
    /// 批次号（从1开始）
    pub batch_number: usize,

    /// 规划出的批次总数
    pub total_batches: usize,

    /// 本批包含的章节数
    pub item_count: usize,
}

impl BatchCtx {
    pub fn new(batch_number: usize, total_batches: usize, item_count: usize) -> Self {
        Self {
            batch_number,
            total_batches,
            item_count,
        }
    }
}

impl Display for BatchCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[批次 {}/{}]", self.batch_number, self.total_batches)
    }
}
