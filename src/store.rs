//! Task store port
//!
//! The policy layer reads task names and descriptions from the store and
//! writes recovery verdicts back onto the task. The in-memory implementation
//! backs the server; persistence belongs to whatever store replaces it.

use crate::errors::{PolicyError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A task as the policy layer sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_status")]
    pub status: String,

    /// Free-form fields written by orchestration steps
    #[serde(default)]
    pub fields: Map<String, Value>,
}

fn default_status() -> String {
    "pending".to_string()
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        workspace_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            workspace_id: workspace_id.into(),
            name: name.into(),
            description: String::new(),
            status: default_status(),
            fields: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Key-value task CRUD, without transactional guarantees
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn get_task(&self, id: &str) -> Result<Task>;

    /// Merge `fields` into the task; a `status` string also updates the status
    async fn update_task_fields(&self, id: &str, fields: Map<String, Value>) -> Result<()>;

    async fn list_tasks(&self, workspace_id: &str) -> Result<Vec<Task>>;
}

/// Task store held in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<String, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a task
    pub async fn insert(&self, task: Task) {
        self.tasks.write().await.insert(task.id.clone(), task);
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn get_task(&self, id: &str) -> Result<Task> {
        self.tasks
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PolicyError::TaskNotFound(id.to_string()))
    }

    async fn update_task_fields(&self, id: &str, fields: Map<String, Value>) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| PolicyError::TaskNotFound(id.to_string()))?;

        for (key, value) in fields {
            if key == "status" {
                if let Value::String(status) = &value {
                    task.status = status.clone();
                    continue;
                }
            }
            task.fields.insert(key, value);
        }
        Ok(())
    }

    async fn list_tasks(&self, workspace_id: &str) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.workspace_id == workspace_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tasks)
    }
}
