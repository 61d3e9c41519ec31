use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;

use crate::config::Config;
use crate::models::Task;

#[derive(Serialize)]
struct CreateBody<'a> {
    task: &'a str,
}

#[derive(Serialize)]
struct UpdateBody {
    completada: bool,
}

/// HTTP client for the backend task collection. Best-effort: no timeouts
/// beyond reqwest defaults, no retries at this layer (the sync worker owns
/// retry policy for mutations).
#[derive(Clone)]
pub struct RemoteStore {
    client: Client,
    base_url: String,
}

impl RemoteStore {
    pub fn new(config: &Config) -> Self {
        RemoteStore {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/todos", self.base_url)
    }

    fn item_url(&self, id: u64) -> String {
        format!("{}/todos/{}", self.base_url, id)
    }

    /// Fetches the full collection. Server order is kept as-is.
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let response = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .context("Failed to reach the task server")?
            .error_for_status()
            .context("Task server rejected the listing request")?;

        let tasks = response
            .json()
            .await
            .context("Failed to decode the task listing")?;
        Ok(tasks)
    }

    /// Creates a task with the given description. The server assigns its own
    /// id and defaults completion to false; the response body is ignored.
    pub async fn create_task(&self, description: &str) -> Result<()> {
        self.client
            .post(self.collection_url())
            .json(&CreateBody { task: description })
            .send()
            .await
            .context("Failed to send create request")?
            .error_for_status()
            .context("Task server rejected the create request")?;
        Ok(())
    }

    pub async fn set_completed(&self, id: u64, completed: bool) -> Result<()> {
        self.client
            .put(self.item_url(id))
            .json(&UpdateBody { completada: completed })
            .send()
            .await
            .context("Failed to send update request")?
            .error_for_status()
            .context("Task server rejected the update request")?;
        Ok(())
    }

    pub async fn delete_task(&self, id: u64) -> Result<()> {
        self.client
            .delete(self.item_url(id))
            .send()
            .await
            .context("Failed to send delete request")?
            .error_for_status()
            .context("Task server rejected the delete request")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_matches_wire_contract() {
        let body = serde_json::to_value(CreateBody { task: "buy milk" }).unwrap();
        assert_eq!(body, serde_json::json!({"task": "buy milk"}));
    }

    #[test]
    fn update_body_matches_wire_contract() {
        let body = serde_json::to_value(UpdateBody { completada: true }).unwrap();
        assert_eq!(body, serde_json::json!({"completada": true}));
    }

    #[test]
    fn urls_target_the_collection_resource() {
        let store = RemoteStore::new(&Config {
            base_url: "http://localhost:3000".to_string(),
        });
        assert_eq!(store.collection_url(), "http://localhost:3000/todos");
        assert_eq!(store.item_url(42), "http://localhost:3000/todos/42");
    }
}
