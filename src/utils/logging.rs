//! 日志工具模块
//!
//! 提供日志格式化和输出的辅助函数

use crate::config::RunConfig;
use crate::models::{BatchOutcome, RunReport, RunStatus};
use anyhow::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{error, info, warn};

/// 初始化运行日志文件（写入带时间戳的表头）
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    let log_header = format!(
        "{}\n批量查询日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    if let Some(parent) = log_file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 把每个批次的结果追加到运行日志文件
pub fn append_report(log_file_path: &Path, report: &RunReport) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    writeln!(
        file,
        "章节数: {} | 批次数: {} | 状态: {:?}",
        report.total_items, report.total_batches, report.status
    )?;
    for entry in &report.outcomes {
        writeln!(file, "批次 {} | {}", entry.batch_number, entry.outcome)?;
    }
    writeln!(
        file,
        "成功 {} | 失败 {} | 跳过 {}",
        report.done(),
        report.failed(),
        report.skipped()
    )?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(run: &RunConfig) {
    info!("{}", "=".repeat(60));
    info!("🚀 开始批量查询 - {}/{}", run.provider_id, run.model_id);
    info!("📂 输入目录: {}", run.input_dir.display());
    info!("📂 输出目录: {}", run.output_dir.display());
    info!("📊 并发数: {}，批次大小: {}", run.concurrency, run.batch_size);
    info!("{}", "=".repeat(60));
}

/// 记录章节与批次规划信息
///
/// # 参数
/// - `total_items`: 过滤后的章节数
/// - `total_batches`: 规划出的批次数
/// - `missing`: 需要处理的批次数
pub fn log_plan(total_items: usize, total_batches: usize, missing: usize) {
    info!("✓ 共 {} 个章节文件，规划为 {} 个批次", total_items, total_batches);
    if missing < total_batches {
        info!("♻️ 已有 {} 个批次的结果，跳过", total_batches - missing);
    }
    info!("📋 需要处理 {} 个批次", missing);
}

/// 记录单个批次的最终结果
pub fn log_batch_outcome(batch_number: usize, outcome: &BatchOutcome) {
    match outcome {
        BatchOutcome::Done => info!("批次 {} 处理成功", batch_number),
        BatchOutcome::Failed(reason) => error!("批次 {} 处理失败: {}", batch_number, reason),
        BatchOutcome::Skipped => warn!("批次 {} 已跳过（收到中止请求）", batch_number),
    }
}

/// 打印最终统计信息
pub fn print_final_stats(report: &RunReport) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    match report.status {
        RunStatus::NoWork => info!("💤 没有需要处理的批次"),
        RunStatus::Completed | RunStatus::Cancelled => {
            let total = report.outcomes.len();
            info!("✅ 成功: {}/{}", report.done(), total);
            info!("❌ 失败: {}", report.failed());
            if report.status == RunStatus::Cancelled {
                info!("⏹️ 跳过: {}（已中止）", report.skipped());
            }
        }
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("第一章开始", 3), "第一章...");
        assert_eq!(truncate_text("短", 3), "短");
    }

    #[test]
    fn test_init_log_file_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");
        init_log_file(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("批量查询日志"));
    }

    #[test]
    fn test_append_report() {
        use crate::models::BatchReport;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        init_log_file(&path).unwrap();
        let report = RunReport {
            status: RunStatus::Completed,
            total_items: 3,
            total_batches: 3,
            outcomes: vec![
                BatchReport { batch_number: 1, outcome: BatchOutcome::Done },
                BatchReport { batch_number: 2, outcome: BatchOutcome::Failed("超时".into()) },
            ],
        };
        append_report(&path, &report).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("批次 1 | 成功"));
        assert!(content.contains("批次 2 | 失败: 超时"));
        assert!(content.contains("成功 1 | 失败 1 | 跳过 0"));
    }
}
