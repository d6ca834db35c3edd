//! 批处理策略
//!
//! 调用方可以传结构化的选项，也可以传一段 JSON 文本。两种形式在这里统一
//! 解析成 [`BatchPolicy`]，下游只认这一种类型。

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ValidationError;

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_CONCURRENCY: usize = 3;
pub const DEFAULT_RETRY_COUNT: u32 = 0;

/// 校验后的批处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPolicy {
    batch_size: usize,
    concurrency: usize,
    continue_on_error: bool,
    retry_count: u32,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            continue_on_error: false,
            retry_count: DEFAULT_RETRY_COUNT,
        }
    }
}

impl BatchPolicy {
    /// 每批条目数（> 0）
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 批内最大并发数（> 0，可能大于批大小）
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }

    /// 首次尝试之外的最大重试次数
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }
}

/// 结构化的处理选项，所有字段都可以省略
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<i64>,
}

impl BatchOptions {
    /// 校验并补齐默认值
    pub fn resolve(&self) -> Result<BatchPolicy, ValidationError> {
        let batch_size = match self.batch_size {
            Some(value) => positive("batchSize", value)?,
            None => DEFAULT_BATCH_SIZE,
        };
        let concurrency = match self.concurrency {
            Some(value) => positive("concurrency", value)?,
            None => DEFAULT_CONCURRENCY,
        };
        let retry_count = match self.retry_count {
            Some(value) if value < 0 => {
                return Err(ValidationError::InvalidOption {
                    field: "retryCount",
                    value,
                    reason: "不能为负数",
                })
            }
            Some(value) => u32::try_from(value).map_err(|_| ValidationError::InvalidOption {
                field: "retryCount",
                value,
                reason: "超出范围",
            })?,
            None => DEFAULT_RETRY_COUNT,
        };

        Ok(BatchPolicy {
            batch_size,
            concurrency,
            continue_on_error: self.continue_on_error.unwrap_or(false),
            retry_count,
        })
    }
}

fn positive(field: &'static str, value: i64) -> Result<usize, ValidationError> {
    if value <= 0 {
        return Err(ValidationError::InvalidOption {
            field,
            value,
            reason: "必须为正整数",
        });
    }
    usize::try_from(value).map_err(|_| ValidationError::InvalidOption {
        field,
        value,
        reason: "超出范围",
    })
}

/// 调用方提供的处理选项：结构化对象或 JSON 文本
///
/// 从任务文件读取时字段类型不在这里检查，统一推迟到 [`PolicyInput::resolve`]，
/// 这样表格和文本两种写法出错时都是校验错误。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPolicyInput")]
pub enum PolicyInput {
    Options(BatchOptions),
    Text(String),
    /// 尚未校验的表格
    Table(JsonValue),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPolicyInput {
    Text(String),
    Table(JsonValue),
}

impl From<RawPolicyInput> for PolicyInput {
    fn from(raw: RawPolicyInput) -> Self {
        match raw {
            RawPolicyInput::Text(text) => PolicyInput::Text(text),
            RawPolicyInput::Table(value) => PolicyInput::Table(value),
        }
    }
}

impl Default for PolicyInput {
    fn default() -> Self {
        PolicyInput::Options(BatchOptions::default())
    }
}

impl From<BatchOptions> for PolicyInput {
    fn from(options: BatchOptions) -> Self {
        PolicyInput::Options(options)
    }
}

impl From<&str> for PolicyInput {
    fn from(text: &str) -> Self {
        PolicyInput::Text(text.to_string())
    }
}

impl PolicyInput {
    /// 解析为校验后的策略
    ///
    /// 空白文本视为未提供选项
    pub fn resolve(&self) -> Result<BatchPolicy, ValidationError> {
        match self {
            PolicyInput::Options(options) => options.resolve(),
            PolicyInput::Text(text) if text.trim().is_empty() => BatchOptions::default().resolve(),
            PolicyInput::Text(text) => serde_json::from_str::<BatchOptions>(text)
                .map_err(|source| ValidationError::OptionsParseFailed { source })?
                .resolve(),
            PolicyInput::Table(value) => serde_json::from_value::<BatchOptions>(value.clone())
                .map_err(|source| ValidationError::OptionsParseFailed { source })?
                .resolve(),
        }
    }
}
