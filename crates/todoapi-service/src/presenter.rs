//! JSON:API views of domain values.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use todoapi_lib::{Todo, TodoId, UserProfile};
use todoapi_service_shared::{Attributes, JsonApiResource, ResourceDescriptor};

/// A todo as exposed over HTTP (`type: "todos"`).
#[derive(Debug, Clone, PartialEq)]
pub struct TodoPresenter {
    pub id: TodoId,
    pub content: String,
    pub is_done: bool,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl From<Todo> for TodoPresenter {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            content: todo.content,
            is_done: todo.is_done,
            created_date: todo.created_date,
            updated_date: todo.updated_date,
        }
    }
}

fn timestamp(value: DateTime<Utc>) -> Value {
    Value::String(value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl JsonApiResource for TodoPresenter {
    fn to_jsonapi(&self) -> ResourceDescriptor {
        let mut attributes = Attributes::new();
        attributes.insert("content".to_string(), json!(self.content));
        attributes.insert("isDone".to_string(), json!(self.is_done));
        attributes.insert("createdate".to_string(), timestamp(self.created_date));
        attributes.insert("updateddate".to_string(), timestamp(self.updated_date));
        ResourceDescriptor::new("todos", self.id, attributes)
    }
}

/// Answer of `/auth/is_authenticated` (`type: "auth"`, fixed id `"1"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsAuthPresenter {
    pub username: String,
}

impl From<UserProfile> for IsAuthPresenter {
    fn from(profile: UserProfile) -> Self {
        Self {
            username: profile.username,
        }
    }
}

impl JsonApiResource for IsAuthPresenter {
    fn to_jsonapi(&self) -> ResourceDescriptor {
        let mut attributes = Attributes::new();
        attributes.insert("username".to_string(), json!(self.username));
        ResourceDescriptor::new("auth", 1, attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_todo_presenter_descriptor() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let todo = Todo {
            id: 42,
            content: "water plants".to_string(),
            is_done: true,
            created_date: created,
            updated_date: created,
        };
        let descriptor = TodoPresenter::from(todo).to_jsonapi();
        assert_eq!(descriptor.resource_type, "todos");
        assert_eq!(descriptor.id, "42");
        assert_eq!(descriptor.attributes["isDone"], json!(true));
        assert_eq!(
            descriptor.attributes["createdate"],
            json!("2024-05-01T12:00:00.000Z")
        );
        assert!(descriptor.relationships.is_none());
    }

    #[test]
    fn test_is_auth_presenter_descriptor() {
        let descriptor = IsAuthPresenter {
            username: "alice".to_string(),
        }
        .to_jsonapi();
        assert_eq!(descriptor.resource_type, "auth");
        assert_eq!(descriptor.id, "1");
        assert_eq!(descriptor.attributes["username"], json!("alice"));
        assert_eq!(descriptor.attributes.len(), 1);
    }
}
