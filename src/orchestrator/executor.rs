//! 批量执行器 - 编排层
//!
//! ## 职责
//!
//! 所有批量动作共用的执行入口：
//!
//! 1. **解析选项**：结构化对象或 JSON 文本 → `BatchPolicy`，非法时直接返回，不执行任何条目
//! 2. **分批**：按 `batchSize` 切分，批次之间严格串行
//! 3. **批内并发**：每批最多 `concurrency` 个条目同时执行
//! 4. **重试**：临时性失败按 `retryCount` 重试
//! 5. **汇总**：按输入顺序输出报告，`continueOnError = false` 时遇到失败即中止

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{BatchPolicy, BatchReport, OperationItem, PolicyInput};
use crate::orchestrator::aggregator::ResultAggregator;
use crate::orchestrator::operation::ItemOperation;
use crate::orchestrator::planner::{batch_count, plan_batches};
use crate::orchestrator::retry::{Backoff, RetryController};
use crate::orchestrator::scheduler::BatchScheduler;
use crate::utils::logging;

/// 批量执行器
#[derive(Debug, Clone, Default)]
pub struct BulkExecutor {
    backoff: Backoff,
}

impl BulkExecutor {
    pub fn new(backoff: Backoff) -> Self {
        Self { backoff }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Backoff::from_config(config))
    }

    /// 解析选项并执行
    ///
    /// # 参数
    /// - `label`: 日志中显示的动作名称
    /// - `items`: 按顺序排列的条目
    /// - `options`: 处理选项（结构化或 JSON 文本）
    /// - `operation`: 单个条目的执行函数
    ///
    /// # 返回
    /// 选项非法时返回校验错误；否则总是返回报告（可能已中止）
    pub async fn execute<O>(
        &self,
        label: &str,
        items: &[OperationItem],
        options: &PolicyInput,
        operation: O,
    ) -> AppResult<BatchReport>
    where
        O: ItemOperation,
    {
        let policy = options.resolve().map_err(|e| {
            warn!("⚠️ 批量{}的处理选项不合法: {}", label, e);
            e
        })?;

        Ok(self
            .execute_with_policy(label, items, policy, Arc::new(operation))
            .await)
    }

    /// 用已校验的策略执行
    pub async fn execute_with_policy<O>(
        &self,
        label: &str,
        items: &[OperationItem],
        policy: BatchPolicy,
        operation: Arc<O>,
    ) -> BatchReport
    where
        O: ItemOperation + ?Sized,
    {
        let total = items.len();
        if total == 0 {
            info!("批量{}: 没有需要处理的条目", label);
            return BatchReport::empty();
        }

        let total_batches = batch_count(total, policy.batch_size());
        logging::log_bulk_start(label, total, &policy, total_batches);

        let retry = Arc::new(RetryController::new(policy.retry_count(), self.backoff));
        let scheduler = BatchScheduler::new(policy.concurrency(), !policy.continue_on_error());
        let mut aggregator = ResultAggregator::new(total);
        let mut aborted = false;

        for batch in plan_batches(items, policy.batch_size()) {
            let batch_number = batch.number;
            logging::log_batch_start(batch_number, total_batches, batch.start + 1, batch.end(), total);

            let run = scheduler
                .run_batch(batch, operation.clone(), retry.clone())
                .await;

            logging::log_batch_complete(batch_number, run.success(), run.outcomes.len());
            let halted = run.halted;
            aggregator.record_all(run.outcomes);

            if halted {
                warn!(
                    "⚠️ 第 {} 批出现失败且未开启 continueOnError，停止后续批次",
                    batch_number
                );
                aborted = true;
                break;
            }
        }

        let report = aggregator.finish(aborted);
        logging::log_bulk_complete(label, &report);
        report
    }
}
