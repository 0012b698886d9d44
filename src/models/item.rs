//! 输入条目（章节文件）

use regex::Regex;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 只取扩展名前最后一个下划线后的数字，如 第140章__不懂规矩？_140.txt → 140
    RE.get_or_init(|| Regex::new(r"_(\d+)\.txt$").expect("static regex"))
}

/// 章节序号，保存去掉前导零的数字串，任意长度都能比较
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChapterNumber(String);

impl ChapterNumber {
    fn from_digits(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        Self(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for ChapterNumber {
    // 无前导零时，位数少的数值更小；位数相同按字典序即数值序
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for ChapterNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 从文件名中提取排序用的章节序号
pub fn chapter_number(file_name: &str) -> Option<ChapterNumber> {
    suffix_regex()
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| ChapterNumber::from_digits(m.as_str()))
}

/// 一个待处理的章节文件，枚举后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    path: PathBuf,
    name: String,
    sort_key: Option<ChapterNumber>,
}

impl Item {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sort_key = chapter_number(&name);
        Self {
            path,
            name,
            sort_key,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 文件名（不含目录）
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sort_key(&self) -> Option<&ChapterNumber> {
        self.sort_key.as_ref()
    }
}

impl Ord for Item {
    /// 有序号的在前按序号升序，没有序号的排在最后按文件名排序
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.sort_key, &other.sort_key) {
            (Some(a), Some(b)) => a.cmp(b).then_with(|| self.name.cmp(&other.name)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.name.cmp(&other.name),
        }
        .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
