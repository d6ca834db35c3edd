//! 失败记录服务 - 业务能力层
//!
//! 只负责"写失败记录文件"能力，不关心流程

use std::fs::OpenOptions;
use std::io::Write;

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{OperationItem, OperationOutcome, OutcomeResult};

/// 失败记录服务
///
/// 职责：
/// - 将最终失败的条目追加写入失败记录文件
/// - 只处理单个条目
pub struct FailureWriter {
    failure_file_path: String,
}

impl FailureWriter {
    /// 创建新的失败记录服务
    pub fn new() -> Self {
        Self {
            failure_file_path: "failed_items.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            failure_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.failure_file_path
    }

    /// 写入一条失败记录
    ///
    /// # 参数
    /// - `job_name`: 批量任务名称
    /// - `item`: 失败的条目
    /// - `outcome`: 该条目的结果，成功结果会被忽略
    pub fn write(
        &self,
        job_name: &str,
        item: &OperationItem,
        outcome: &OperationOutcome,
    ) -> AppResult<()> {
        let OutcomeResult::Failure {
            kind,
            message,
            attempts,
        } = &outcome.result
        else {
            return Ok(());
        };

        debug!(
            "写入失败记录: 任务 {} | 条目 {} | {}",
            job_name,
            outcome.index + 1,
            kind
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.failure_file_path)
            .map_err(|e| AppError::file_write_failed(&self.failure_file_path, e))?;

        let line = format!(
            "任务 {} | 条目 {} | {} | {} | 尝试 {} 次 | {}\n",
            job_name,
            outcome.index + 1,
            item.identity(),
            kind,
            attempts,
            message
        );

        file.write_all(line.as_bytes())
            .map_err(|e| AppError::file_write_failed(&self.failure_file_path, e))?;

        Ok(())
    }
}

impl Default for FailureWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperationError;
    use serde_json::json;

    #[test]
    fn test_only_failures_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed.txt");
        let writer = FailureWriter::with_path(path.to_str().unwrap());
        let item = OperationItem::with_id("86abc");

        writer
            .write("整理", &item, &OperationOutcome::success(0, json!({})))
            .unwrap();
        writer
            .write(
                "整理",
                &item,
                &OperationOutcome::failure(3, &OperationError::terminal("Task not found"), 1),
            )
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("条目 4"));
        assert!(content.contains("id=86abc"));
        assert!(content.contains("terminal"));
        assert!(content.contains("Task not found"));
    }
}
