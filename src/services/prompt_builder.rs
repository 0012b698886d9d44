//! Prompt 组装服务 - 业务能力层
//!
//! 负责读取 Prompt 模板、拼接批次内容，不关心调用和并发

use crate::config::INPUT_PLACEHOLDER;
use crate::error::ConfigError;
use crate::models::Item;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

/// Prompt 模板，运行开始时读取一次
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// 读取模板文件；读不到或缺少占位符都属于配置错误
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::TemplateReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(text.trim(), path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        match text.matches(INPUT_PLACEHOLDER).count() {
            0 => Err(ConfigError::MissingPlaceholder {
                path: path.to_path_buf(),
                placeholder: INPUT_PLACEHOLDER,
            }),
            1 => Ok(Self {
                text: text.to_string(),
            }),
            n => {
                warn!(
                    "Prompt 文件 '{}' 中出现 {} 次占位符，将全部替换",
                    path.display(),
                    n
                );
                Ok(Self {
                    text: text.to_string(),
                })
            }
        }
    }

    /// 用批次内容替换占位符
    pub fn render(&self, payload: &str) -> String {
        self.text.replace(INPUT_PLACEHOLDER, payload)
    }
}

/// 一个章节在 payload 中的片段
pub fn format_section(name: &str, content: &str) -> String {
    format!("\n=== {} ===\n{}\n", name, content)
}

/// 批次内容拼接结果
#[derive(Debug, Default)]
pub struct BatchPayload {
    pub text: String,
    /// 实际纳入的章节数
    pub included: usize,
    /// 读取失败或内容为空而被排除的章节数
    pub excluded: usize,
}

impl BatchPayload {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// 按顺序读取批次中的章节并拼接
///
/// 单个文件读取失败只记录日志并排除该文件，不影响整个批次。
pub async fn build_payload(batch_number: usize, items: &[Item]) -> BatchPayload {
    let mut payload = BatchPayload::default();

    for item in items {
        match fs::read_to_string(item.path()).await {
            Ok(content) => {
                let content = content.trim();
                if content.is_empty() {
                    debug!("[批次 {}] 跳过空文件: {}", batch_number, item.name());
                    payload.excluded += 1;
                    continue;
                }
                payload.text.push_str(&format_section(item.name(), content));
                payload.included += 1;
            }
            Err(e) => {
                warn!(
                    "[批次 {}] 读取文件 {} 失败: {}",
                    batch_number,
                    item.path().display(),
                    e
                );
                payload.excluded += 1;
            }
        }
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_requires_placeholder() {
        let path = Path::new("prompt.txt");
        let err = PromptTemplate::parse("总结以下内容", path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingPlaceholder { .. }));

        let template = PromptTemplate::parse("请总结：{input_content}\n完毕", path).unwrap();
        assert_eq!(template.render("ABC"), "请总结：ABC\n完毕");
    }

    #[tokio::test]
    async fn test_load_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let err = PromptTemplate::load(&dir.path().join("none.txt")).await.unwrap_err();
        assert!(matches!(err, ConfigError::TemplateReadFailed { .. }));
    }

    #[tokio::test]
    async fn test_build_payload_format_and_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_1.txt"), "  第一章内容\n").unwrap();
        std::fs::write(dir.path().join("b_2.txt"), "   \n").unwrap();
        std::fs::write(dir.path().join("c_3.txt"), "第三章").unwrap();

        let items = vec![
            Item::new(dir.path().join("a_1.txt")),
            Item::new(dir.path().join("b_2.txt")),
            Item::new(dir.path().join("missing_4.txt")),
            Item::new(dir.path().join("c_3.txt")),
        ];
        let payload = build_payload(1, &items).await;

        assert_eq!(payload.included, 2);
        assert_eq!(payload.excluded, 2);
        assert_eq!(
            payload.text,
            "\n=== a_1.txt ===\n第一章内容\n\n=== c_3.txt ===\n第三章\n"
        );
    }

    #[tokio::test]
    async fn test_build_payload_all_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![Item::new(dir.path().join("gone_1.txt"))];
        let payload = build_payload(2, &items).await;
        assert!(payload.is_empty());
        assert_eq!(payload.excluded, 1);
    }
}
