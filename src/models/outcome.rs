//! 单条结果与批处理报告

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{ErrorKind, OperationError};

/// 单条任务的处理结果，带有它在输入中的位置
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub index: usize,
    #[serde(flatten)]
    pub result: OutcomeResult,
}

/// 成功负载或失败详情
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum OutcomeResult {
    Success {
        payload: JsonValue,
    },
    Failure {
        kind: ErrorKind,
        message: String,
        attempts: u32,
    },
}

impl OperationOutcome {
    pub fn success(index: usize, payload: JsonValue) -> Self {
        Self {
            index,
            result: OutcomeResult::Success { payload },
        }
    }

    pub fn failure(index: usize, error: &OperationError, attempts: u32) -> Self {
        Self {
            index,
            result: OutcomeResult::Failure {
                kind: error.kind,
                message: error.message.clone(),
                attempts,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.result, OutcomeResult::Success { .. })
    }

    /// 失败时的尝试次数
    pub fn attempts(&self) -> Option<u32> {
        match self.result {
            OutcomeResult::Failure { attempts, .. } => Some(attempts),
            OutcomeResult::Success { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.result {
            OutcomeResult::Failure { kind, .. } => Some(kind),
            OutcomeResult::Success { .. } => None,
        }
    }
}

/// 一次批量调用的完整报告
///
/// 每次调用新建，交给调用方后不再修改
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// 输入条目总数
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub aborted: bool,
    /// 按输入顺序排列的结果
    pub outcomes: Vec<OperationOutcome>,
}

impl BatchReport {
    /// 由已产生的结果构建报告，计数只统计实际产生的结果
    pub fn new(total: usize, outcomes: Vec<OperationOutcome>, aborted: bool) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - succeeded;
        Self {
            total,
            succeeded,
            failed,
            aborted,
            outcomes,
        }
    }

    pub fn empty() -> Self {
        Self::new(0, Vec::new(), false)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// 是否没有任何失败且全部条目都已处理
    pub fn is_complete_success(&self) -> bool {
        !self.aborted && self.failed == 0 && self.outcomes.len() == self.total
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// 未被执行的条目数（只在中止时大于 0）
    pub fn skipped(&self) -> usize {
        self.total - self.outcomes.len()
    }

    /// 单行摘要
    pub fn summary(&self) -> String {
        format!(
            "共 {} 条: 成功 {}, 失败 {}, 未执行 {}{}",
            self.total,
            self.succeeded,
            self.failed,
            self.skipped(),
            if self.aborted { " (已中止)" } else { "" }
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
