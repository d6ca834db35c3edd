use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 校验错误（策略或任务参数非法）
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

/// 校验错误
///
/// 出现在批处理真正开始之前，不会触发任何远程调用
#[derive(Debug, Error)]
pub enum ValidationError {
    /// 文本形式的处理选项无法解析
    #[error("处理选项解析失败: {source}")]
    OptionsParseFailed {
        #[source]
        source: serde_json::Error,
    },
    /// 某个选项字段的取值非法
    #[error("处理选项 {field} 取值非法: {value} ({reason})")]
    InvalidOption {
        field: &'static str,
        value: i64,
        reason: &'static str,
    },
    /// 缺少批量操作所需的列表
    #[error("批量{verb}操作缺少 {field}")]
    MissingContainer {
        verb: &'static str,
        field: &'static str,
    },
    /// 任务条目本身不合法
    #[error("任务条目不合法: {0}")]
    InvalidItem(String),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 无法创建 HTTP 客户端
    #[error("无法创建 HTTP 客户端: {source}")]
    ClientBuildFailed {
        #[source]
        source: reqwest::Error,
    },
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// API 返回错误响应
    #[error("API返回错误响应 ({endpoint}): status={status}, message={message}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 请求频率限制
    #[error("API请求频率限制 ({endpoint}), 建议等待: {retry_after:?}秒")]
    RateLimited {
        endpoint: String,
        retry_after: Option<u64>,
    },
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        #[source]
        source: serde_json::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

// ========== 单条任务的错误 ==========

/// 单条任务失败的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 输入不合法，重试无意义
    Validation,
    /// 网络、限流、服务端临时故障，可以重试
    Transient,
    /// 业务拒绝、不存在、无权限，重试无意义
    Terminal,
}

impl ErrorKind {
    /// 是否允许重试
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Transient => "transient",
            ErrorKind::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

/// 单条任务执行失败
///
/// 由各个批量动作的执行函数返回，重试控制器只看 `kind` 决定是否重试
#[derive(Debug, Clone, Error)]
#[error("[{kind}] {message}")]
pub struct OperationError {
    pub kind: ErrorKind,
    pub message: String,
    /// 服务端建议的等待时间（限流响应）
    pub retry_after: Option<Duration>,
}

impl OperationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, message)
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Terminal, message)
    }

    /// 附带服务端建议的等待时间
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<ValidationError> for OperationError {
    fn from(err: ValidationError) -> Self {
        OperationError::validation(err.to_string())
    }
}

impl From<ApiError> for OperationError {
    fn from(err: ApiError) -> Self {
        match &err {
            ApiError::RateLimited { retry_after, .. } => {
                let op = OperationError::transient(err.to_string());
                match retry_after {
                    Some(secs) => op.with_retry_after(Duration::from_secs(*secs)),
                    None => op,
                }
            }
            ApiError::RequestFailed { source, .. } => {
                if source.is_timeout() || source.is_connect() || source.is_request() {
                    OperationError::transient(err.to_string())
                } else {
                    OperationError::terminal(err.to_string())
                }
            }
            ApiError::BadResponse { status, .. } => {
                OperationError::new(classify_status(*status), err.to_string())
            }
            ApiError::ClientBuildFailed { .. } | ApiError::JsonParseFailed { .. } => {
                OperationError::terminal(err.to_string())
            }
        }
    }
}

/// 根据 HTTP 状态码判断失败分类
pub fn classify_status(status: u16) -> ErrorKind {
    match status {
        408 | 429 => ErrorKind::Transient,
        500..=599 => ErrorKind::Transient,
        400 | 422 => ErrorKind::Validation,
        _ => ErrorKind::Terminal,
    }
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed { source: err })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: err,
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: err,
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为校验错误
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(429), ErrorKind::Transient);
        assert_eq!(classify_status(408), ErrorKind::Transient);
        assert_eq!(classify_status(502), ErrorKind::Transient);
        assert_eq!(classify_status(400), ErrorKind::Validation);
        assert_eq!(classify_status(422), ErrorKind::Validation);
        assert_eq!(classify_status(401), ErrorKind::Terminal);
        assert_eq!(classify_status(403), ErrorKind::Terminal);
        assert_eq!(classify_status(404), ErrorKind::Terminal);
    }

    #[test]
    fn test_rate_limited_carries_retry_after() {
        let err = OperationError::from(ApiError::RateLimited {
            endpoint: "task/abc".to_string(),
            retry_after: Some(3),
        });

        assert_eq!(err.kind, ErrorKind::Transient);
        assert_eq!(err.retry_after, Some(Duration::from_secs(3)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_app_error_wraps_each_layer() {
        let validation = AppError::from(ValidationError::InvalidItem("x".to_string()));
        let file = AppError::from(FileError::DirectoryNotFound {
            path: "jobs".to_string(),
        });

        assert!(validation.is_validation());
        assert!(!file.is_validation());
        assert!(file.to_string().contains("jobs"));
    }

    #[test]
    fn test_validation_error_is_not_retryable() {
        let err = OperationError::from(ValidationError::InvalidItem("缺少 taskId".to_string()));
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(!err.is_retryable());
    }
}
