//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! - `executor` - 批量执行入口：解析选项、分批、汇总报告
//! - `planner` - 把条目切分成连续的批次
//! - `scheduler` - 批内并发（Semaphore）与失败后停止派发
//! - `retry` - 单个条目的重试与指数退避
//! - `aggregator` - 按输入位置收集结果
//! - `operation` - 单个条目执行函数的抽象
//! - `job_runner` - 应用入口，逐个执行任务文件
//!
//! ## 层次关系
//!
//! ```text
//! job_runner (处理 Vec<BulkJob>)
//!     ↓
//! services::BulkTaskService (创建 / 更新 / 移动 / 删除)
//!     ↓
//! executor → planner → scheduler → retry → ItemOperation
//!     ↓
//! clients::TaskClient (远程 API)
//! ```

pub mod aggregator;
pub mod executor;
pub mod job_runner;
pub mod operation;
pub mod planner;
pub mod retry;
pub mod scheduler;

// 重新导出主要类型
pub use aggregator::ResultAggregator;
pub use executor::BulkExecutor;
pub use job_runner::{App, ProcessingStats};
pub use operation::ItemOperation;
pub use planner::{batch_count, plan_batches, Batch};
pub use retry::{Backoff, RetryController};
pub use scheduler::{BatchRun, BatchScheduler};
