//! 批内并发调度
//!
//! 一个批次内最多同时执行 `concurrency` 个条目，任一条目完成后立即派发下
//! 一个。批次之间严格串行，由上层保证。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::error::OperationError;
use crate::models::{OperationItem, OperationOutcome};
use crate::orchestrator::operation::ItemOperation;
use crate::orchestrator::planner::Batch;
use crate::orchestrator::retry::RetryController;

/// 单个批次的执行结果
#[derive(Debug, Default)]
pub struct BatchRun {
    /// 已派发条目的结果，按输入顺序排列
    pub outcomes: Vec<OperationOutcome>,
    /// 是否因失败而停止派发
    pub halted: bool,
}

impl BatchRun {
    pub fn success(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.success()
    }
}

/// 批内并发调度器
#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    concurrency: usize,
    stop_on_failure: bool,
}

impl BatchScheduler {
    pub fn new(concurrency: usize, stop_on_failure: bool) -> Self {
        Self {
            concurrency: concurrency.max(1),
            stop_on_failure,
        }
    }

    /// 执行一个批次
    ///
    /// 先拿到并发许可再派发条目。`stop_on_failure` 时，一旦有条目最终失败，
    /// 已经在执行的条目继续跑完，之后不再派发新的条目。
    ///
    /// # 参数
    /// - `batch`: 要执行的批次
    /// - `operation`: 条目的执行函数
    /// - `retry`: 重试控制器
    pub async fn run_batch<O>(
        &self,
        batch: Batch<'_, OperationItem>,
        operation: Arc<O>,
        retry: Arc<RetryController>,
    ) -> BatchRun
    where
        O: ItemOperation + ?Sized,
    {
        // 并发数超过批大小没有意义，按批大小截断
        let limit = self.concurrency.min(batch.len()).max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let failure_seen = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(batch.len());

        debug!("[批次 {}] 并发上限: {}", batch.number, limit);

        // 为本批创建并发任务
        for (offset, item) in batch.items.iter().enumerate() {
            let index = batch.start + offset;
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };

            if self.stop_on_failure && failure_seen.load(Ordering::Acquire) {
                warn!(
                    "[批次 {}] 已出现失败，停止派发 (剩余 {} 条未执行)",
                    batch.number,
                    batch.len() - offset
                );
                break;
            }

            let item = item.clone();
            let operation = operation.clone();
            let retry = retry.clone();
            let failure_seen = failure_seen.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let outcome = AssertUnwindSafe(retry.run(operation.as_ref(), &item, index))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        // 重试次数随 panic 一起丢失，attempts 只记 1
                        let reason = format!(
                            "任务执行时 panic，实际尝试次数未知: {}",
                            panic_message(payload.as_ref())
                        );
                        error!("[条目 {}] {}", index + 1, reason);
                        OperationOutcome::failure(index, &OperationError::terminal(reason), 1)
                    });
                if !outcome.is_success() {
                    // 必须在释放许可之前标记
                    failure_seen.store(true, Ordering::Release);
                }
                outcome
            });
            handles.push((index, handle));
        }

        // 等待本批所有任务完成
        let mut run = BatchRun {
            outcomes: Vec::with_capacity(handles.len()),
            halted: false,
        };

        for (index, handle) in handles {
            match handle.await {
                Ok(outcome) => run.outcomes.push(outcome),
                Err(e) => {
                    error!("[条目 {}] 任务被取消: {}", index + 1, e);
                    failure_seen.store(true, Ordering::Release);
                    let err = OperationError::terminal(format!("任务被取消: {}", e));
                    run.outcomes.push(OperationOutcome::failure(index, &err, 1));
                }
            }
        }

        run.halted = self.stop_on_failure && failure_seen.load(Ordering::Acquire);
        run
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "未知原因".to_string()
    }
}
