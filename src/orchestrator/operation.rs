//! 单条任务的执行函数
//!
//! 每个批量动作（创建/更新/移动/删除）提供自己的执行函数，编排层只把它
//! 当作黑盒调用。

use std::future::Future;

use futures::future::BoxFuture;
use serde_json::Value as JsonValue;

use crate::error::OperationError;
use crate::models::OperationItem;

/// 对单个条目执行一次远程操作
///
/// 每次重试都会重新调用 `perform`，因此实现不能依赖上一次调用的状态
pub trait ItemOperation: Send + Sync + 'static {
    fn perform(&self, item: OperationItem) -> BoxFuture<'static, Result<JsonValue, OperationError>>;
}

impl<F, Fut> ItemOperation for F
where
    F: Fn(OperationItem) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<JsonValue, OperationError>> + Send + 'static,
{
    fn perform(&self, item: OperationItem) -> BoxFuture<'static, Result<JsonValue, OperationError>> {
        Box::pin(self(item))
    }
}
