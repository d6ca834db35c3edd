//! # Task Bulk Ops
//!
//! 一个用于批量创建、更新、移动、删除远程任务的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 持有 HTTP 客户端，只暴露单次远程调用能力
//! - `TaskClient` - 任务 API 的创建 / 更新 / 移动 / 删除
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个条目
//! - `BulkTaskService` - 四个批量动作的参数校验和单条执行函数
//! - `FailureWriter` - 写失败记录文件能力
//!
//! ### ③ 执行层（Orchestrator）
//! - `BulkExecutor` - 解析选项 → 分批 → 批内并发 → 重试 → 汇总
//! - 所有批量动作共用，不关心具体动作
//!
//! ### ④ 编排层（App）
//! - `orchestrator/job_runner` - 加载任务文件，逐个执行并统计
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use clients::TaskClient;
pub use config::Config;
pub use error::{AppError, AppResult, ErrorKind, OperationError};
pub use models::{
    BatchOptions, BatchPolicy, BatchReport, BulkJob, BulkVerb, ItemIdentity, OperationItem,
    OperationOutcome, OutcomeResult, PolicyInput,
};
pub use orchestrator::{App, Backoff, BulkExecutor, ItemOperation};
pub use services::{BulkTaskService, FailureWriter};
