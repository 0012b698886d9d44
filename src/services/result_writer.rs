//! 结果写入服务 - 业务能力层
//!
//! 只负责"把一个批次的结果写成文件"能力，不关心流程

use crate::error::{AppError, AppResult};
use crate::services::resume_index::artifact_path;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// 结果写入服务
///
/// 职责：
/// - 按 `{前缀}_bs{批次大小}_批次{N}.txt` 写出结果
/// - 每个批次号独占一个文件，并发写入不会冲突
/// - 已存在的同名文件会被覆盖
/// - 先写 `.{文件名}.tmp` 再重命名，失败时不会留下可被续跑识别的半截文件
#[derive(Debug, Clone)]
pub struct ResultWriter {
    output_dir: PathBuf,
    name_prefix: String,
    batch_size: usize,
}

impl ResultWriter {
    pub fn new(output_dir: impl Into<PathBuf>, name_prefix: impl Into<String>, batch_size: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            name_prefix: name_prefix.into(),
            batch_size,
        }
    }

    pub fn path_for(&self, batch_number: usize) -> PathBuf {
        artifact_path(&self.output_dir, &self.name_prefix, self.batch_size, batch_number)
    }

    /// 写入一个批次的结果，返回文件路径
    pub async fn write(&self, batch_number: usize, content: &str) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| AppError::file_write_failed(&self.output_dir, source))?;

        let path = self.path_for(batch_number);
        let tmp = temp_path_for(&path);
        debug!("写入批次 {} 结果: {} 字符", batch_number, content.chars().count());

        let written = match fs::write(&tmp, content).await {
            Ok(()) => fs::rename(&tmp, &path)
                .await
                .map_err(|source| AppError::file_write_failed(&path, source)),
            Err(source) => Err(AppError::file_write_failed(&tmp, source)),
        };
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("清理临时文件失败 {}: {}", tmp.display(), cleanup);
                }
            }
            return Err(e);
        }

        Ok(path)
    }
}

/// 同目录下的隐藏临时文件名，续跑索引不会把它当成结果
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::resume_index::completed_batches;

    #[tokio::test]
    async fn test_written_artifact_is_recognised_by_resume_index() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let writer = ResultWriter::new(&out, "人物关系", 4);

        let path = writer.write(9, "结果").await.unwrap();
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("人物关系_bs4_批次9.txt")
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "结果");

        let done = completed_batches(&out, "人物关系", 4).await.unwrap();
        assert!(done.contains(&9));
        let other_size = completed_batches(&out, "人物关系", 5).await.unwrap();
        assert!(other_size.is_empty());
    }

    #[tokio::test]
    async fn test_temp_file_is_not_counted_as_done() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path(), "人物关系", 4);
        let tmp = temp_path_for(&writer.path_for(3));
        assert_eq!(
            tmp.file_name().and_then(|n| n.to_str()),
            Some(".人物关系_bs4_批次3.txt.tmp")
        );

        // 模拟写到一半中断的情况
        std::fs::write(&tmp, "半截").unwrap();
        let done = completed_batches(dir.path(), "人物关系", 4).await.unwrap();
        assert!(done.is_empty());

        writer.write(3, "完整结果").await.unwrap();
        assert!(!tmp.exists());
        let done = completed_batches(dir.path(), "人物关系", 4).await.unwrap();
        assert!(done.contains(&3));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path(), "p", 1);
        // 目标位置是目录，重命名失败
        std::fs::create_dir(writer.path_for(2)).unwrap();

        assert!(writer.write(2, "内容").await.is_err());
        assert!(!temp_path_for(&writer.path_for(2)).exists());
        assert!(writer.path_for(2).is_dir());
    }

    #[tokio::test]
    async fn test_overwrites_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path(), "p", 1);
        writer.write(1, "旧").await.unwrap();
        let path = writer.write(1, "新").await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "新");
    }
}
