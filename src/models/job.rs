use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::models::item::OperationItem;
use crate::models::policy::PolicyInput;

/// 批量动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkVerb {
    Create,
    Update,
    Move,
    Delete,
}

impl BulkVerb {
    /// 用于日志的中文名称
    pub fn label(self) -> &'static str {
        match self {
            BulkVerb::Create => "创建",
            BulkVerb::Update => "更新",
            BulkVerb::Move => "移动",
            BulkVerb::Delete => "删除",
        }
    }
}

impl fmt::Display for BulkVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 一个批量任务文件
///
/// ```toml
/// verb = "move"
/// target_list_id = "901234"
/// options = '{"batchSize": 5, "retryCount": 2}'
///
/// [[items]]
/// taskId = "86abc123"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct BulkJob {
    #[serde(default)]
    pub name: Option<String>,
    pub verb: BulkVerb,
    /// 创建任务时的目标列表
    #[serde(default, alias = "listId")]
    pub list_id: Option<String>,
    /// 移动任务时的目标列表
    #[serde(default, alias = "targetListId")]
    pub target_list_id: Option<String>,
    #[serde(default)]
    pub options: PolicyInput,
    #[serde(default)]
    pub items: Vec<OperationItem>,
    #[serde(skip)]
    pub file_path: Option<String>,
}

impl BulkJob {
    /// 用于日志显示的名称：优先 name，其次文件名
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.file_path
            .as_deref()
            .and_then(|p| Path::new(p).file_stem())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("批量{}", self.verb))
    }

    /// 当前动作需要的列表 ID
    pub fn container(&self) -> Option<&str> {
        match self.verb {
            BulkVerb::Create => self.list_id.as_deref(),
            BulkVerb::Move => self.target_list_id.as_deref(),
            BulkVerb::Update | BulkVerb::Delete => None,
        }
    }
}
