//! Thin async client for the todo API.
//!
//! Every call maps one-to-one onto an HTTP route; the server's `{ "message" }`
//! body is surfaced as [`ClientError::Api`] for non-2xx responses.

use domain::{ListTodosQuery, MessageResponse, NewTodo, Todo, TodoChanges, TodoId, TodoStats};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Api { status: StatusCode, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http(e) => e.status(),
            ClientError::Api { status, .. } => Some(*status),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// Client bound to an API base URL such as `http://localhost:3000/api`.
#[derive(Debug, Clone)]
pub struct TodoClient {
    http: Client,
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Unset query parameters are left off the request.
    pub async fn get_todos(&self, query: &ListTodosQuery) -> Result<Vec<Todo>, ClientError> {
        self.send(self.request(Method::GET, "/todos").query(query))
            .await
    }

    pub async fn get_todo(&self, id: &TodoId) -> Result<Todo, ClientError> {
        self.send(self.request(Method::GET, &format!("/todos/{id}")))
            .await
    }

    pub async fn create_todo(&self, input: &NewTodo) -> Result<Todo, ClientError> {
        self.send(self.request(Method::POST, "/todos").json(input))
            .await
    }

    pub async fn update_todo(&self, id: &TodoId, changes: &TodoChanges) -> Result<Todo, ClientError> {
        self.send(self.request(Method::PUT, &format!("/todos/{id}")).json(changes))
            .await
    }

    pub async fn toggle_todo(&self, id: &TodoId) -> Result<Todo, ClientError> {
        self.send(self.request(Method::PATCH, &format!("/todos/{id}/toggle")))
            .await
    }

    pub async fn delete_todo(&self, id: &TodoId) -> Result<MessageResponse, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/todos/{id}")))
            .await
    }

    pub async fn get_stats(&self) -> Result<TodoStats, ClientError> {
        self.send(self.request(Method::GET, "/todos/stats/overview"))
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{path}", self.base_url))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<MessageResponse>(&body)
        .map(|m| m.message)
        .unwrap_or(body);
    tracing::debug!(%status, %message, "Todo API returned an error");

    Err(ClientError::Api { status, message })
}
