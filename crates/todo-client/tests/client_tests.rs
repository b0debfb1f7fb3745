//! Drives a real server on an ephemeral port through `TodoClient`.

use domain::{ListTodosQuery, NewTodo, Priority, TodoChanges, TodoId};
use reqwest::StatusCode;
use todo_api::{app_with_state, AppState};
use todo_client::{ClientError, TodoClient};

async fn spawn_server() -> TodoClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app_with_state(AppState::default());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TodoClient::new(format!("http://{addr}/api"))
}

#[tokio::test]
async fn test_create_get_update_delete() {
    let client = spawn_server().await;

    let created = client
        .create_todo(&NewTodo {
            priority: Some(Priority::High),
            category: Some("errands".to_string()),
            ..NewTodo::new("Buy milk")
        })
        .await
        .unwrap();
    assert!(!created.completed);
    assert_eq!(created.category, "errands");

    assert_eq!(client.get_todo(&created.id).await.unwrap(), created);

    let updated = client
        .update_todo(
            &created.id,
            &TodoChanges {
                title: Some("Buy oat milk".to_string()),
                ..TodoChanges::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Buy oat milk");
    assert_eq!(updated.priority, Priority::High);

    let toggled = client.toggle_todo(&created.id).await.unwrap();
    assert!(toggled.completed);

    let deleted = client.delete_todo(&created.id).await.unwrap();
    assert_eq!(deleted.message, "Todo deleted successfully");

    let err = client.get_todo(&created.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_validation_errors_carry_server_message() {
    let client = spawn_server().await;

    let err = client.create_todo(&NewTodo::new("  ")).await.unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(message.contains("title is required"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_list_query_and_stats() {
    let client = spawn_server().await;

    for (title, completed) in [("a", false), ("b", true), ("c", false)] {
        client
            .create_todo(&NewTodo {
                completed,
                ..NewTodo::new(title)
            })
            .await
            .unwrap();
    }

    let all = client.get_todos(&ListTodosQuery::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let pending = client
        .get_todos(&ListTodosQuery {
            completed: Some("false".to_string()),
            sort_by: Some("title".to_string()),
            sort_order: Some("asc".to_string()),
            ..ListTodosQuery::default()
        })
        .await
        .unwrap();
    let titles: Vec<_> = pending.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "c"]);

    let stats = client.get_stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.by_priority["medium"], 3);
}

#[tokio::test]
async fn test_missing_todo_is_not_found() {
    let client = spawn_server().await;
    let id = TodoId::new();

    assert!(client.toggle_todo(&id).await.unwrap_err().is_not_found());
    assert!(client.delete_todo(&id).await.unwrap_err().is_not_found());
}
