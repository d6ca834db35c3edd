use std::time::Duration;

use serde_json::json;
use task_bulk_ops::models::{BatchOptions, BulkJob, OperationItem, PolicyInput};
use task_bulk_ops::{
    AppError, Backoff, BulkExecutor, BulkTaskService, Config, ErrorKind, OutcomeResult, TaskClient,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "pk_test_token";

fn service_for(server: &MockServer) -> BulkTaskService {
    let config = Config {
        api_base_url: server.uri(),
        api_token: TOKEN.to_string(),
        team_id: Some("9001".to_string()),
        request_timeout_secs: 5,
        ..Config::default()
    };
    let client = TaskClient::new(&config).expect("创建客户端失败");
    let executor = BulkExecutor::new(Backoff::new(
        Duration::from_millis(1),
        Duration::from_millis(20),
    ));
    BulkTaskService::with_client(client, executor)
}

fn item(value: serde_json::Value) -> OperationItem {
    OperationItem::from_json(value).expect("条目格式错误")
}

fn continue_on_error(retry_count: i64) -> PolicyInput {
    PolicyInput::Options(BatchOptions {
        continue_on_error: Some(true),
        retry_count: Some(retry_count),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_create_tasks_posts_each_item_to_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/list/901/task"))
        .and(header("authorization", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "86new" })))
        .expect(2)
        .mount(&server)
        .await;

    let items = vec![
        item(json!({ "name": "写周报", "priority": 2 })),
        item(json!({ "description": "没有名字" })),
        item(json!({ "name": "复盘会议" })),
    ];

    let report = service_for(&server)
        .create_tasks("901", &items, &continue_on_error(0))
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert!(!report.aborted);
    assert_eq!(report.outcomes[1].error_kind(), Some(ErrorKind::Validation));
    match &report.outcomes[0].result {
        OutcomeResult::Success { payload } => assert_eq!(payload["id"], "86new"),
        other => panic!("应当成功: {:?}", other),
    }
}

#[tokio::test]
async fn test_update_retries_after_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/task/86abc"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/task/86abc"))
        .and(body_json(json!({ "status": "done" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "86abc", "status": "done" })))
        .expect(1)
        .mount(&server)
        .await;

    let items = vec![item(json!({ "taskId": "86abc", "status": "done" }))];
    let report = service_for(&server)
        .update_tasks(&items, &PolicyInput::from(r#"{"retryCount": 2}"#))
        .await
        .unwrap();

    assert!(report.is_complete_success());
    assert_eq!(report.succeeded, 1);
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/task/86abc"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "err": "maintenance" })))
        .expect(2)
        .mount(&server)
        .await;

    let items = vec![item(json!({ "taskId": "86abc", "status": "done" }))];
    let report = service_for(&server)
        .update_tasks(&items, &continue_on_error(1))
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.outcomes[0].attempts(), Some(2));
    assert_eq!(report.outcomes[0].error_kind(), Some(ErrorKind::Transient));
}

#[tokio::test]
async fn test_not_found_aborts_remaining_deletes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/task/t0"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/task/t1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "err": "Task not found", "ECODE": "ITEM_013" })))
        .expect(1)
        .mount(&server)
        .await;
    for id in ["t2", "t3"] {
        Mock::given(method("DELETE"))
            .and(path(format!("/task/{}", id)))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;
    }

    let items: Vec<_> = (0..4).map(|i| OperationItem::with_id(format!("t{}", i))).collect();
    let options = PolicyInput::from(r#"{"batchSize": 2, "concurrency": 1, "retryCount": 3}"#);

    let report = service_for(&server)
        .delete_tasks(&items, &options)
        .await
        .unwrap();

    assert!(report.aborted);
    assert_eq!(report.len(), 2);
    assert_eq!(report.skipped(), 2);
    match &report.outcomes[0].result {
        OutcomeResult::Success { payload } => {
            assert_eq!(payload, &json!({ "id": "t0", "deleted": true }))
        }
        other => panic!("应当成功: {:?}", other),
    }
    match &report.outcomes[1].result {
        OutcomeResult::Failure {
            kind,
            message,
            attempts,
        } => {
            assert_eq!(*kind, ErrorKind::Terminal);
            assert_eq!(*attempts, 1);
            assert!(message.contains("Task not found"));
        }
        other => panic!("应当失败: {:?}", other),
    }
}

#[tokio::test]
async fn test_move_with_custom_id_sends_team_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/list/902/task/DEV-12"))
        .and(query_param("custom_task_ids", "true"))
        .and(query_param("team_id", "9001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let items = vec![item(json!({ "taskId": "DEV-12" }))];
    let report = service_for(&server)
        .move_tasks("902", &items, &PolicyInput::default())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 1);
    match &report.outcomes[0].result {
        OutcomeResult::Success { payload } => {
            assert_eq!(payload, &json!({ "id": "DEV-12", "listId": "902" }))
        }
        other => panic!("应当成功: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_target_list_sends_nothing() {
    let server = MockServer::start().await;
    let items = vec![OperationItem::with_id("86abc")];

    let result = service_for(&server)
        .move_tasks("  ", &items, &PolicyInput::default())
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_job_file_runs_through_service() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(5)
        .mount(&server)
        .await;

    let mut toml_text = String::from(
        "name = \"关闭过期任务\"\nverb = \"update\"\noptions = '{\"batchSize\": 2, \"concurrency\": 2}'\n",
    );
    for i in 0..5 {
        toml_text.push_str(&format!("\n[[items]]\ntaskId = \"86t{}\"\nstatus = \"closed\"\n", i));
    }
    let job: BulkJob = toml::from_str(&toml_text).unwrap();

    let report = service_for(&server).run(&job).await.unwrap();

    assert_eq!(job.display_name(), "关闭过期任务");
    assert_eq!(report.total, 5);
    assert!(report.is_complete_success());
    let indexes: Vec<usize> = report.outcomes.iter().map(|o| o.index).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3, 4]);

    let rendered: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(rendered["succeeded"], 5);
    assert_eq!(rendered["outcomes"][0]["status"], "success");
}
