//! 任务条目
//!
//! 一个条目 = 身份描述 + 不透明的负载。条目一旦提交就不再修改。

use std::fmt;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::ValidationError;

/// 自定义任务 ID 的格式，例如 `DEV-1234`
const CUSTOM_ID_PATTERN: &str = r"^[A-Z][A-Z0-9]*-\d+$";

/// 条目的身份描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemIdentity {
    /// 明确的任务 ID（自定义 ID 会被自动识别）
    Id(String),
    /// 强制按自定义 ID 寻址
    CustomId(String),
    /// 任务名称 + 所在列表
    Named {
        name: String,
        container: Option<String>,
    },
    /// 没有身份信息（例如待创建的任务）
    Unspecified,
}

impl ItemIdentity {
    /// 解析为可直接寻址的任务引用
    ///
    /// 按名称寻址需要先查出 ID，这里不做，直接判为不合法
    pub fn task_ref(&self) -> Result<TaskRef<'_>, ValidationError> {
        match self {
            ItemIdentity::Id(id) if id.trim().is_empty() => {
                Err(ValidationError::InvalidItem("taskId 不能为空".to_string()))
            }
            ItemIdentity::Id(id) if looks_like_custom_id(id) => Ok(TaskRef::Custom(id)),
            ItemIdentity::Id(id) => Ok(TaskRef::Id(id)),
            ItemIdentity::CustomId(id) if id.trim().is_empty() => {
                Err(ValidationError::InvalidItem("customTaskId 不能为空".to_string()))
            }
            ItemIdentity::CustomId(id) => Ok(TaskRef::Custom(id)),
            ItemIdentity::Named {
                name,
                container: None,
            } => Err(ValidationError::InvalidItem(format!(
                "使用 taskName \"{}\" 时必须同时提供 listName",
                name
            ))),
            ItemIdentity::Named { name, .. } => Err(ValidationError::InvalidItem(format!(
                "不支持按名称 \"{}\" 查找任务，请提供 taskId",
                name
            ))),
            ItemIdentity::Unspecified => Err(ValidationError::InvalidItem(
                "缺少 taskId / customTaskId".to_string(),
            )),
        }
    }
}

impl fmt::Display for ItemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemIdentity::Id(id) => write!(f, "id={}", id),
            ItemIdentity::CustomId(id) => write!(f, "custom_id={}", id),
            ItemIdentity::Named {
                name,
                container: Some(container),
            } => write!(f, "name={} @ {}", name, container),
            ItemIdentity::Named {
                name,
                container: None,
            } => write!(f, "name={}", name),
            ItemIdentity::Unspecified => write!(f, "-"),
        }
    }
}

/// 可直接寻址的任务引用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRef<'a> {
    Id(&'a str),
    Custom(&'a str),
}

impl<'a> TaskRef<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            TaskRef::Id(id) | TaskRef::Custom(id) => id,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, TaskRef::Custom(_))
    }
}

/// 判断 ID 是否是自定义任务 ID
pub fn looks_like_custom_id(id: &str) -> bool {
    Regex::new(CUSTOM_ID_PATTERN)
        .map(|re| re.is_match(id.trim()))
        .unwrap_or(false)
}

/// 一个待执行的任务条目
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawItem")]
pub struct OperationItem {
    identity: ItemIdentity,
    payload: Map<String, JsonValue>,
}

impl OperationItem {
    pub fn new(identity: ItemIdentity, payload: Map<String, JsonValue>) -> Self {
        Self { identity, payload }
    }

    /// 按任务 ID 创建条目，负载为空
    pub fn with_id(id: impl Into<String>) -> Self {
        Self::new(ItemIdentity::Id(id.into()), Map::new())
    }

    /// 从 JSON 对象创建条目，身份字段会被提取出来
    pub fn from_json(value: JsonValue) -> Result<Self, ValidationError> {
        serde_json::from_value::<RawItem>(value)
            .map(Self::from)
            .map_err(|e| ValidationError::InvalidItem(e.to_string()))
    }

    pub fn identity(&self) -> &ItemIdentity {
        &self.identity
    }

    pub fn payload(&self) -> &Map<String, JsonValue> {
        &self.payload
    }

    /// 读取负载里的字符串字段
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }
}

/// 条目的原始形态（与工具参数的字段名保持一致）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    custom_task_id: Option<String>,
    #[serde(default)]
    task_name: Option<String>,
    #[serde(default)]
    list_name: Option<String>,
    #[serde(flatten)]
    payload: Map<String, JsonValue>,
}

impl From<RawItem> for OperationItem {
    fn from(raw: RawItem) -> Self {
        let mut payload = raw.payload;
        // customTaskId > taskId > taskName
        let identity = match (raw.custom_task_id, raw.task_id, raw.task_name) {
            (Some(custom), _, _) => ItemIdentity::CustomId(custom),
            (None, Some(id), _) => ItemIdentity::Id(id),
            (None, None, Some(name)) => {
                return Self {
                    identity: ItemIdentity::Named {
                        name,
                        container: raw.list_name,
                    },
                    payload,
                };
            }
            (None, None, None) => ItemIdentity::Unspecified,
        };

        // 没有作为所在列表使用的 listName 留在负载里
        if let Some(list_name) = raw.list_name {
            payload.insert("listName".to_string(), JsonValue::String(list_name));
        }

        Self { identity, payload }
    }
}
