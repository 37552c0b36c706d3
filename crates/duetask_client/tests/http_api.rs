use duetask_client::{ClientError, HttpTaskApi, TaskApi};
use duetask_core::{NewTask, TaskPatch};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn task_json(id: Uuid, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "completed": false,
        "important": false,
        "dueAt": null,
        "notified": false,
        "createdAt": 1_700_000_000_000_i64,
        "updatedAt": 1_700_000_000_000_i64,
    })
}

#[tokio::test]
async fn list_decodes_server_tasks() {
    let server = MockServer::start().await;
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([task_json(first, "newer"), task_json(second, "older")])),
        )
        .mount(&server)
        .await;

    let tasks = HttpTaskApi::new(server.uri()).list_tasks().await.unwrap();
    let ids: Vec<Uuid> = tasks.iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![first, second]);
    assert_eq!(tasks[0].title, "newer");
}

#[tokio::test]
async fn create_posts_camel_case_payload() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .and(body_json(json!({
            "title": "Pay rent",
            "completed": false,
            "important": false,
            "dueAt": 1_700_000_060_000_i64,
            "notified": false,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(task_json(id, "Pay rent")))
        .expect(1)
        .mount(&server)
        .await;

    let input = NewTask::new("Pay rent").with_due_at(Some(1_700_000_060_000));
    let task = HttpTaskApi::new(server.uri()).create_task(&input).await.unwrap();
    assert_eq!(task.id, id);
}

#[tokio::test]
async fn update_sends_only_changed_fields() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    let mut updated = task_json(id, "done");
    updated["completed"] = json!(true);
    Mock::given(method("PUT"))
        .and(path(format!("/tasks/{id}")))
        .and(body_json(json!({ "completed": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&server)
        .await;

    let task = HttpTaskApi::new(server.uri())
        .update_task(id, &TaskPatch::completed(true))
        .await
        .unwrap();
    assert!(task.completed);
}

#[tokio::test]
async fn error_status_carries_server_message() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("DELETE"))
        .and(path(format!("/tasks/{id}")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": format!("task {id} not found") })),
        )
        .mount(&server)
        .await;

    let err = HttpTaskApi::new(server.uri()).delete_task(id).await.unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("not found"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = HttpTaskApi::new(format!("http://{addr}"))
        .list_tasks()
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
}
