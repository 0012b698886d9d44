use crate::error::{AppError, AppResult, ConfigError, FileError};
use crate::models::item::Item;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

/// 扫描目录下所有 txt 章节文件，按章节序号自然排序
///
/// 只看目录的第一层，返回调用时刻的快照。
/// 以 `.` 开头的隐藏文件不参与；指向文件的符号链接按文件处理。
pub async fn scan_items(input_dir: &Path) -> AppResult<Vec<Item>> {
    if !input_dir.is_dir() {
        return Err(ConfigError::InputDirNotFound {
            path: input_dir.to_path_buf(),
        }
        .into());
    }

    let read_dir_failed = |source| {
        AppError::File(FileError::ReadDirFailed {
            path: input_dir.to_path_buf(),
            source,
        })
    };

    let input_dir = fs::canonicalize(input_dir).await.map_err(read_dir_failed)?;
    let mut items = Vec::new();
    let mut entries = fs::read_dir(&input_dir).await.map_err(read_dir_failed)?;

    while let Some(entry) = entries.next_entry().await.map_err(read_dir_failed)? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("txt") {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        // metadata 会跟随符号链接
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => items.push(Item::new(path)),
            Ok(_) => {}
            Err(e) => warn!("无法获取文件信息 {}: {}", path.display(), e),
        }
    }

    items.sort();
    Ok(items)
}

/// 按位置范围过滤（左闭右闭，从 1 开始）
///
/// 未给出的起点视为 1，终点视为总数；两端都夹到 `[1, 总数]` 内，
/// 夹完后起点大于终点时返回空列表。
pub fn apply_range(items: Vec<Item>, start: Option<usize>, end: Option<usize>) -> Vec<Item> {
    if start.is_none() && end.is_none() {
        return items;
    }

    let total = items.len();
    let start_idx = start.unwrap_or(1).max(1) - 1;
    let end_idx = end.unwrap_or(total).min(total);

    if start_idx >= end_idx {
        warn!(
            "起始位置 {:?} 大于终止位置 {:?}，没有文件需要处理",
            start, end
        );
        return Vec::new();
    }

    let filtered: Vec<Item> = items
        .into_iter()
        .skip(start_idx)
        .take(end_idx - start_idx)
        .collect();
    info!(
        "根据位置范围 [{}, {}] 过滤后，剩余 {} 个文件",
        start_idx + 1,
        end_idx,
        filtered.len()
    );
    filtered
}
