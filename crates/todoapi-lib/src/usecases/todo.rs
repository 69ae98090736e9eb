use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result};
use crate::model::{Todo, TodoId};
use crate::repository::TodoRepository;

/// CRUD operations on todos.
#[derive(Clone)]
pub struct TodoUseCases {
    repository: Arc<dyn TodoRepository>,
}

impl TodoUseCases {
    pub fn new(repository: Arc<dyn TodoRepository>) -> Self {
        Self { repository }
    }

    pub fn get(&self, id: TodoId) -> Result<Todo> {
        self.repository.find_by_id(id)
    }

    pub fn list(&self) -> Result<Vec<Todo>> {
        self.repository.find_all()
    }

    pub fn add(&self, content: &str) -> Result<Todo> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Validation {
                message: "content must not be empty".to_string(),
            });
        }
        let todo = self.repository.insert(content)?;
        info!(todo_id = todo.id, "new todo has been inserted");
        Ok(todo)
    }

    pub fn update(&self, id: TodoId, is_done: bool) -> Result<()> {
        self.repository.update_content(id, is_done)?;
        info!(todo_id = id, is_done, "todo has been updated");
        Ok(())
    }

    pub fn delete(&self, id: TodoId) -> Result<()> {
        self.repository.delete_by_id(id)?;
        info!(todo_id = id, "todo has been deleted");
        Ok(())
    }
}

impl std::fmt::Debug for TodoUseCases {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoUseCases").finish_non_exhaustive()
    }
}
