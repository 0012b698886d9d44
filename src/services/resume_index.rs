//! 断点续跑索引 - 业务能力层
//!
//! 结果文件本身就是完成记录：`{前缀}_bs{批次大小}_批次{N}.txt`

use crate::error::{AppError, AppResult, FileError};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// 批次结果文件名
pub fn artifact_name(prefix: &str, batch_size: usize, batch_number: usize) -> String {
    format!("{}_bs{}_批次{}.txt", prefix, batch_size, batch_number)
}

pub fn artifact_path(output_dir: &Path, prefix: &str, batch_size: usize, batch_number: usize) -> PathBuf {
    output_dir.join(artifact_name(prefix, batch_size, batch_number))
}

fn artifact_regex(prefix: &str, batch_size: usize) -> Regex {
    let pattern = format!(r"^{}_bs{}_批次(\d+)\.txt$", regex::escape(prefix), batch_size);
    // 前缀已转义，模式总是合法的
    Regex::new(&pattern).expect("escaped artifact pattern")
}

/// 扫描输出目录，返回已完成的批次号集合
///
/// 输出目录不存在时视为没有任何已完成批次。
pub async fn completed_batches(
    output_dir: &Path,
    prefix: &str,
    batch_size: usize,
) -> AppResult<BTreeSet<usize>> {
    let mut done = BTreeSet::new();
    if !output_dir.is_dir() {
        return Ok(done);
    }

    let read_dir_failed = |source| {
        AppError::File(FileError::ReadDirFailed {
            path: output_dir.to_path_buf(),
            source,
        })
    };

    let re = artifact_regex(prefix, batch_size);
    let mut entries = fs::read_dir(output_dir).await.map_err(read_dir_failed)?;
    while let Some(entry) = entries.next_entry().await.map_err(read_dir_failed)? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(number) = re
            .captures(name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
        {
            done.insert(number);
        }
    }

    debug!("输出目录中已有 {} 个完成的批次", done.len());
    Ok(done)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_name() {
        assert_eq!(artifact_name("分析结果", 10, 3), "分析结果_bs10_批次3.txt");
        assert_eq!(artifact_name("查询结果", 5, 12), "查询结果_bs5_批次12.txt");
    }

    #[tokio::test]
    async fn test_completed_batches_matches_prefix_and_size() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "分析结果_bs10_批次1.txt",
            "分析结果_bs10_批次12.txt",
            "分析结果_bs5_批次2.txt",
            "其他_bs10_批次3.txt",
            "分析结果_bs10_批次4.md",
            "前缀分析结果_bs10_批次5.txt",
        ] {
            std::fs::write(dir.path().join(name), "ok").unwrap();
        }

        let done = completed_batches(dir.path(), "分析结果", 10).await.unwrap();
        assert_eq!(done.into_iter().collect::<Vec<_>>(), vec![1, 12]);
    }

    #[tokio::test]
    async fn test_prefix_with_regex_metacharacters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(artifact_name("a.b(1)", 3, 7)), "ok").unwrap();
        std::fs::write(dir.path().join("axb(1)_bs3_批次8.txt"), "ok").unwrap();

        let done = completed_batches(dir.path(), "a.b(1)", 3).await.unwrap();
        assert_eq!(done.into_iter().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_missing_output_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let done = tokio_test::block_on(completed_batches(&dir.path().join("out"), "x", 1)).unwrap();
        assert!(done.is_empty());
    }
}
