//! 重试控制器
//!
//! 包裹单个条目的执行函数：临时性失败按指数退避重试，其余失败立即返回。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::OperationError;
use crate::models::{OperationItem, OperationOutcome};
use crate::orchestrator::operation::ItemOperation;

/// 指数退避参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    factor: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            max: Duration::from_secs(30),
            factor: 2,
        }
    }
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            factor: 2,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Duration::from_millis(config.retry_base_delay_ms),
            Duration::from_millis(config.retry_max_delay_ms),
        )
    }

    /// 第 `retry` 次重试前的等待时间（从1开始），不超过上限
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        let multiplier = self.factor.saturating_pow(exponent);
        self.base.saturating_mul(multiplier).min(self.max)
    }

    /// 结合服务端的等待建议
    pub fn delay_with_hint(&self, retry: u32, hint: Option<Duration>) -> Duration {
        let computed = self.delay_for(retry);
        match hint {
            Some(hint) => computed.max(hint).min(self.max),
            None => computed,
        }
    }
}

/// 单条任务的重试控制
#[derive(Debug, Clone)]
pub struct RetryController {
    retry_count: u32,
    backoff: Backoff,
}

impl RetryController {
    pub fn new(retry_count: u32, backoff: Backoff) -> Self {
        Self {
            retry_count,
            backoff,
        }
    }

    /// 执行一个条目直到成功、遇到不可重试的失败或重试次数用尽
    ///
    /// # 参数
    /// - `operation`: 条目的执行函数
    /// - `item`: 条目
    /// - `index`: 条目在输入中的位置
    ///
    /// # 返回
    /// 返回该条目的最终结果；失败时附带最后一次错误和总尝试次数
    pub async fn run<O>(&self, operation: &O, item: &OperationItem, index: usize) -> OperationOutcome
    where
        O: ItemOperation + ?Sized,
    {
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);

            let err = match operation.perform(item.clone()).await {
                Ok(payload) => {
                    debug!("[条目 {}] ✓ 第 {} 次尝试成功", index + 1, attempts);
                    return OperationOutcome::success(index, payload);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                warn!("[条目 {}] ❌ 不可重试的失败: {}", index + 1, err);
                return OperationOutcome::failure(index, &err, attempts);
            }

            if attempts > self.retry_count {
                warn!(
                    "[条目 {}] ❌ 重试已用尽 (共尝试 {} 次): {}",
                    index + 1,
                    attempts,
                    err
                );
                return OperationOutcome::failure(index, &err, attempts);
            }

            let delay = self.delay_before_retry(attempts, &err);
            warn!(
                "[条目 {}] 临时失败 (尝试 {}/{}), 等待 {:?} 后重试: {}",
                index + 1,
                attempts,
                self.retry_count.saturating_add(1),
                delay,
                err
            );
            sleep(delay).await;
        }
    }

    fn delay_before_retry(&self, attempts: u32, err: &OperationError) -> Duration {
        self.backoff.delay_with_hint(attempts, err.retry_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn counting_operation(
        calls: Arc<AtomicU32>,
        fail_times: u32,
        kind: ErrorKind,
    ) -> impl ItemOperation {
        move |_item: OperationItem| {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= fail_times {
                    Err(OperationError::new(kind, format!("第 {} 次失败", n)))
                } else {
                    Ok(json!({ "call": n }))
                }
            }
        }
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(1000));

        assert_eq!(backoff.delay_for(1), Duration::from_millis(100));
        assert_eq!(backoff.delay_for(2), Duration::from_millis(200));
        assert_eq!(backoff.delay_for(3), Duration::from_millis(400));
        assert_eq!(backoff.delay_for(5), Duration::from_millis(1000));
        assert_eq!(backoff.delay_for(40), Duration::from_millis(1000));

        let delays: Vec<_> = (1..10).map(|n| backoff.delay_for(n)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_retry_after_hint_raises_delay() {
        let backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(5));

        assert_eq!(
            backoff.delay_with_hint(1, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
        assert_eq!(
            backoff.delay_with_hint(1, Some(Duration::from_secs(60))),
            Duration::from_secs(5)
        );
        assert_eq!(backoff.delay_with_hint(2, None), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_transient_makes_n_plus_one_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let op = counting_operation(calls.clone(), u32::MAX, ErrorKind::Transient);
        let controller = RetryController::new(3, Backoff::default());

        let outcome = controller.run(&op, &OperationItem::with_id("a"), 0).await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(outcome.attempts(), Some(4));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Transient));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_then_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let op = counting_operation(calls.clone(), 2, ErrorKind::Transient);
        let controller = RetryController::new(2, Backoff::default());

        let outcome = controller.run(&op, &OperationItem::with_id("a"), 7).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.index, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_terminal_and_validation_are_not_retried() {
        for kind in [ErrorKind::Terminal, ErrorKind::Validation] {
            let calls = Arc::new(AtomicU32::new(0));
            let op = counting_operation(calls.clone(), u32::MAX, kind);
            let controller = RetryController::new(5, Backoff::default());

            let outcome = controller.run(&op, &OperationItem::with_id("a"), 0).await;

            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(outcome.attempts(), Some(1));
            assert_eq!(outcome.error_kind(), Some(kind));
        }
    }

    #[tokio::test]
    async fn test_zero_retry_count_means_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let op = counting_operation(calls.clone(), u32::MAX, ErrorKind::Transient);
        let controller = RetryController::new(0, Backoff::default());

        let outcome = controller.run(&op, &OperationItem::with_id("a"), 0).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.attempts(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_retry_count_logs_without_overflow() {
        // 安装订阅者，让 warn! 真正求值参数
        let _guard = tracing::subscriber::set_default(tracing_subscriber::fmt().finish());
        let calls = Arc::new(AtomicU32::new(0));
        let op = counting_operation(calls.clone(), 1, ErrorKind::Transient);
        let controller = RetryController::new(u32::MAX, Backoff::default());

        let outcome = controller.run(&op, &OperationItem::with_id("a"), 0).await;

        assert!(outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let op = counting_operation(calls.clone(), u32::MAX, ErrorKind::Transient);
        let backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(10));
        let controller = RetryController::new(3, backoff);

        let started = Instant::now();
        controller.run(&op, &OperationItem::with_id("a"), 0).await;

        // 100 + 200 + 400
        assert!(started.elapsed() >= Duration::from_millis(700));
    }
}
