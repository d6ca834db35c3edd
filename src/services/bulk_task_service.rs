//! 批量任务服务 - 业务能力层
//!
//! 把创建/更新/移动/删除四个动作绑定到同一个批量执行器上。每个动作只负责
//! 校验自己的参数并提供单个条目的执行函数，分批、并发、重试都交给执行器。

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};

use crate::clients::TaskClient;
use crate::config::Config;
use crate::error::{AppResult, OperationError, ValidationError};
use crate::models::{BatchReport, BulkJob, BulkVerb, OperationItem, PolicyInput};
use crate::orchestrator::BulkExecutor;

/// 批量任务服务
pub struct BulkTaskService {
    client: Arc<TaskClient>,
    executor: BulkExecutor,
}

impl BulkTaskService {
    /// 根据配置创建服务
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = TaskClient::new(config)?;
        Ok(Self::with_client(client, BulkExecutor::from_config(config)))
    }

    /// 使用已有的客户端和执行器创建
    pub fn with_client(client: TaskClient, executor: BulkExecutor) -> Self {
        Self {
            client: Arc::new(client),
            executor,
        }
    }

    /// 执行一个批量任务文件
    pub async fn run(&self, job: &BulkJob) -> AppResult<BatchReport> {
        let list_id = job.container().unwrap_or_default();
        match job.verb {
            BulkVerb::Create => self.create_tasks(list_id, &job.items, &job.options).await,
            BulkVerb::Update => self.update_tasks(&job.items, &job.options).await,
            BulkVerb::Move => self.move_tasks(list_id, &job.items, &job.options).await,
            BulkVerb::Delete => self.delete_tasks(&job.items, &job.options).await,
        }
    }

    /// 批量创建任务
    ///
    /// # 参数
    /// - `list_id`: 目标列表 ID，为空时不执行任何条目
    /// - `items`: 每个条目的负载就是新任务的字段，必须包含 `name`
    /// - `options`: 处理选项
    pub async fn create_tasks(
        &self,
        list_id: &str,
        items: &[OperationItem],
        options: &PolicyInput,
    ) -> AppResult<BatchReport> {
        let list_id = require_container(BulkVerb::Create, "list_id", list_id)?;
        let client = self.client.clone();

        let operation = move |item: OperationItem| {
            let client = client.clone();
            let list_id = list_id.clone();
            async move {
                let has_name = item
                    .payload_str("name")
                    .is_some_and(|name| !name.trim().is_empty());
                if !has_name {
                    return Err(OperationError::validation("创建任务需要非空的 name 字段"));
                }
                client.create_task(&list_id, item.payload()).await
            }
        };

        self.executor
            .execute(BulkVerb::Create.label(), items, options, operation)
            .await
    }

    /// 批量更新任务
    ///
    /// 条目负载中除身份字段外的所有字段都会提交给远程 API
    pub async fn update_tasks(
        &self,
        items: &[OperationItem],
        options: &PolicyInput,
    ) -> AppResult<BatchReport> {
        let client = self.client.clone();

        let operation = move |item: OperationItem| {
            let client = client.clone();
            async move {
                let task = item.identity().task_ref()?;
                if item.payload().is_empty() {
                    return Err(OperationError::validation(format!(
                        "任务 {} 没有需要更新的字段",
                        task.id()
                    )));
                }
                client.update_task(task, item.payload()).await
            }
        };

        self.executor
            .execute(BulkVerb::Update.label(), items, options, operation)
            .await
    }

    /// 批量移动任务到另一个列表
    ///
    /// # 参数
    /// - `target_list_id`: 目标列表 ID，为空时不执行任何条目
    /// - `items`: 要移动的任务
    /// - `options`: 处理选项
    pub async fn move_tasks(
        &self,
        target_list_id: &str,
        items: &[OperationItem],
        options: &PolicyInput,
    ) -> AppResult<BatchReport> {
        let target = require_container(BulkVerb::Move, "target_list_id", target_list_id)?;
        let client = self.client.clone();

        let operation = move |item: OperationItem| {
            let client = client.clone();
            let target = target.clone();
            async move {
                let task = item.identity().task_ref()?;
                client.move_task(task, &target).await?;
                Ok::<JsonValue, OperationError>(json!({ "id": task.id(), "listId": target }))
            }
        };

        self.executor
            .execute(BulkVerb::Move.label(), items, options, operation)
            .await
    }

    /// 批量删除任务
    pub async fn delete_tasks(
        &self,
        items: &[OperationItem],
        options: &PolicyInput,
    ) -> AppResult<BatchReport> {
        let client = self.client.clone();

        let operation = move |item: OperationItem| {
            let client = client.clone();
            async move {
                let task = item.identity().task_ref()?;
                client.delete_task(task).await?;
                Ok::<JsonValue, OperationError>(json!({ "id": task.id(), "deleted": true }))
            }
        };

        self.executor
            .execute(BulkVerb::Delete.label(), items, options, operation)
            .await
    }
}

/// 校验动作所需的列表 ID
fn require_container(
    verb: BulkVerb,
    field: &'static str,
    value: &str,
) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingContainer {
            verb: verb.label(),
            field,
        });
    }
    Ok(value.to_string())
}
