use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（在任何批次派发之前终止运行）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 单个批次的错误
    #[error("批次错误: {0}")]
    Batch(#[from] BatchError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 并发数必须 >= 1
    #[error("并发数必须大于 0")]
    InvalidConcurrency,
    /// 并发数超过许可池上限
    #[error("并发数 {value} 超过上限 {max}")]
    ConcurrencyTooLarge { value: usize, max: usize },
    /// 批次大小必须 >= 1
    #[error("批次大小必须大于 0")]
    InvalidBatchSize,
    /// 输入目录不存在或不是目录
    #[error("输入目录不存在: {}", path.display())]
    InputDirNotFound { path: PathBuf },
    /// Prompt 模板读取失败
    #[error("读取 Prompt 文件 '{}' 失败: {source}", path.display())]
    TemplateReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Prompt 模板中缺少占位符
    #[error("Prompt 文件 '{}' 中缺少占位符 {placeholder}", path.display())]
    MissingPlaceholder {
        path: PathBuf,
        placeholder: &'static str,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({}): {source}", path.display())]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 未配置的厂商
    #[error("不支持的厂商: {provider}")]
    UnknownProvider { provider: String },
    /// 未指定厂商或模型
    #[error("未指定{what}，且配置文件中没有默认值")]
    MissingSelection { what: &'static str },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: &'static str,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({}): {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 读取目录失败
    #[error("读取目录失败 ({}): {source}", path.display())]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("调用 {provider}/{model} API 失败: {source}")]
    ApiCallFailed {
        provider: String,
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 请求超时
    #[error("调用 {provider}/{model} API 超时 ({secs} 秒)")]
    Timeout {
        provider: String,
        model: String,
        secs: u64,
    },
    /// 返回内容为空
    #[error("LLM 返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 厂商未配置
    #[error("不支持的厂商: {provider}")]
    UnknownProvider { provider: String },
}

/// 批次错误
#[derive(Debug, Error)]
pub enum BatchError {
    /// 批次中所有文件都无法读取或为空
    #[error("批次 {batch_number} 中没有有效的文件内容")]
    NoValidContent { batch_number: usize },
    /// 批次任务异常退出
    #[error("批次 {batch_number} 任务执行失败: {reason}")]
    TaskFailed { batch_number: usize, reason: String },
    /// 并发许可池已关闭
    #[error("批次 {batch_number} 无法获取并发许可")]
    PermitClosed { batch_number: usize },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        provider: impl Into<String>,
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            provider: provider.into(),
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 是否为配置错误
    pub fn is_config(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
