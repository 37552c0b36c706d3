//! Task API contract and its HTTP implementation.
//!
//! # Responsibility
//! - Define the four calls the client makes against the backend.
//! - Translate HTTP responses into tasks or `ClientError`s.
//!
//! # Invariants
//! - Non-2xx responses never decode as tasks.
//! - Updates are sent as sparse PUT bodies.

use crate::error::ClientError;
use async_trait::async_trait;
use duetask_core::{NewTask, Task, TaskId, TaskPatch};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Backend operations used by client state and the due-task watcher.
#[async_trait]
pub trait TaskApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError>;
    async fn create_task(&self, input: &NewTask) -> Result<Task, ClientError>;
    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, ClientError>;
    async fn delete_task(&self, id: TaskId) -> Result<(), ClientError>;
}

/// `reqwest`-backed API client rooted at a fixed base URL.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpTaskApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }

    fn task_url(&self, id: TaskId) -> String {
        format!("{}/tasks/{id}", self.base_url)
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        let response = self.client.get(self.tasks_url()).send().await?;
        decode(response).await
    }

    async fn create_task(&self, input: &NewTask) -> Result<Task, ClientError> {
        let response = self
            .client
            .post(self.tasks_url())
            .json(input)
            .send()
            .await?;
        decode(response).await
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, ClientError> {
        let response = self
            .client
            .put(self.task_url(id))
            .json(patch)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ClientError> {
        let response = self.client.delete(self.task_url(id)).send().await?;
        let _: serde_json::Value = decode(response).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let fallback = status.canonical_reason().unwrap_or("request failed").to_string();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => fallback,
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::HttpTaskApi;

    #[test]
    fn base_url_drops_trailing_slashes() {
        let api = HttpTaskApi::new(" http://localhost:5000// ");
        assert_eq!(api.base_url(), "http://localhost:5000");
        assert_eq!(api.tasks_url(), "http://localhost:5000/tasks");
    }
}
