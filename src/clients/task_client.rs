/// 任务 API 客户端
///
/// 封装所有与远程任务 API 相关的调用逻辑
use std::time::Duration;

use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, OperationError};
use crate::models::TaskRef;
use crate::utils::logging::truncate_text;

/// 任务 API 客户端
#[derive(Debug, Clone)]
pub struct TaskClient {
    http: Client,
    base_url: String,
    token: String,
    team_id: Option<String>,
}

impl TaskClient {
    /// 创建新的任务客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|source| AppError::Api(ApiError::ClientBuildFailed { source }))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
            team_id: config.team_id.clone(),
        })
    }

    /// 在列表中创建任务
    ///
    /// # 参数
    /// - `list_id`: 目标列表 ID
    /// - `payload`: 任务字段
    ///
    /// # 返回
    /// 返回创建后的任务 JSON
    pub async fn create_task(
        &self,
        list_id: &str,
        payload: &Map<String, JsonValue>,
    ) -> Result<JsonValue, OperationError> {
        let path = format!("/list/{}/task", list_id);
        let body = JsonValue::Object(payload.clone());
        Ok(self.send(Method::POST, &path, &[], Some(&body)).await?)
    }

    /// 更新任务字段
    pub async fn update_task(
        &self,
        task: TaskRef<'_>,
        payload: &Map<String, JsonValue>,
    ) -> Result<JsonValue, OperationError> {
        let query = self.ref_query(task)?;
        let path = format!("/task/{}", task.id());
        let body = JsonValue::Object(payload.clone());
        Ok(self.send(Method::PUT, &path, &query, Some(&body)).await?)
    }

    /// 把任务移动到另一个列表
    ///
    /// # 参数
    /// - `task`: 任务引用
    /// - `target_list_id`: 目标列表 ID
    pub async fn move_task(
        &self,
        task: TaskRef<'_>,
        target_list_id: &str,
    ) -> Result<JsonValue, OperationError> {
        let query = self.ref_query(task)?;
        let path = format!("/list/{}/task/{}", target_list_id, task.id());
        Ok(self.send(Method::POST, &path, &query, None).await?)
    }

    /// 删除任务
    pub async fn delete_task(&self, task: TaskRef<'_>) -> Result<JsonValue, OperationError> {
        let query = self.ref_query(task)?;
        let path = format!("/task/{}", task.id());
        Ok(self.send(Method::DELETE, &path, &query, None).await?)
    }

    /// 自定义任务 ID 需要附带工作区 ID
    fn ref_query(&self, task: TaskRef<'_>) -> Result<Vec<(&'static str, String)>, OperationError> {
        if !task.is_custom() {
            return Ok(Vec::new());
        }
        match &self.team_id {
            Some(team_id) => Ok(vec![
                ("custom_task_ids", "true".to_string()),
                ("team_id", team_id.clone()),
            ]),
            None => Err(OperationError::validation(format!(
                "自定义任务 ID {} 需要配置 TASK_TEAM_ID",
                task.id()
            ))),
        }
    }

    /// 发送请求并解析响应
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<&JsonValue>,
    ) -> Result<JsonValue, ApiError> {
        let endpoint = format!("{} {}", method, path);
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, &self.token)
            .header(CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!("请求: {}", endpoint);

        let response = request.send().await.map_err(|source| ApiError::RequestFailed {
            endpoint: endpoint.clone(),
            source,
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(response.headers());
            return Err(ApiError::RateLimited {
                endpoint,
                retry_after,
            });
        }

        let text = response.text().await.map_err(|source| ApiError::RequestFailed {
            endpoint: endpoint.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(ApiError::BadResponse {
                endpoint,
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        debug!("响应 {}: {}", endpoint, truncate_text(&text, 200));

        if text.trim().is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&text).map_err(|source| ApiError::JsonParseFailed { source })
    }
}

/// 读取 Retry-After 秒数
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// 从错误响应中提取可读的错误信息
fn error_message(body: &str) -> String {
    let parsed: Option<JsonValue> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v.get("err")
            .or_else(|| v.get("message"))
            .and_then(|m| m.as_str())
    });

    match message {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => "(空响应)".to_string(),
        None => truncate_text(body.trim(), 200),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_error_message_prefers_err_field() {
        assert_eq!(error_message(r#"{"err": "Task not found", "ECODE": "ITEM_013"}"#), "Task not found");
        assert_eq!(error_message(r#"{"message": "bad"}"#), "bad");
        assert_eq!(error_message(""), "(空响应)");
        assert_eq!(error_message("gateway down"), "gateway down");
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(7));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_custom_id_without_team_is_rejected() {
        let client = TaskClient::new(&Config::default()).unwrap();
        let err = client.ref_query(TaskRef::Custom("DEV-12")).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);

        assert!(client.ref_query(TaskRef::Id("86abc")).unwrap().is_empty());
    }

    #[test]
    fn test_custom_id_adds_team_query() {
        let config = Config {
            team_id: Some("9001".to_string()),
            ..Config::default()
        };
        let client = TaskClient::new(&config).unwrap();
        let query = client.ref_query(TaskRef::Custom("DEV-12")).unwrap();

        assert_eq!(
            query,
            vec![
                ("custom_task_ids", "true".to_string()),
                ("team_id", "9001".to_string())
            ]
        );
    }
}
