//! Text and JSON:API rendering of todo listings.

use chrono::SecondsFormat;
use serde_json::{json, Map, Value};

use todoapi_lib::Todo;
use todoapi_service_shared::{JsonApiDocument, JsonApiFormatter};

/// One line per todo: `[x] 3  water plants`.
pub fn render_text(todos: &[Todo]) -> String {
    if todos.is_empty() {
        return "No todos.\n".to_string();
    }
    todos
        .iter()
        .map(|todo| {
            let mark = if todo.is_done { 'x' } else { ' ' };
            format!("[{mark}] {:<4} {}\n", todo.id, todo.content)
        })
        .collect()
}

/// The listing as a JSON:API document of `todos`, with the count in `meta`.
pub fn render_jsonapi(todos: &[Todo]) -> JsonApiDocument {
    let items = todos
        .iter()
        .map(|todo| {
            json!({
                "id": todo.id,
                "content": todo.content,
                "isDone": todo.is_done,
                "createdate": todo.created_date.to_rfc3339_opts(SecondsFormat::Millis, true),
                "updateddate": todo.updated_date.to_rfc3339_opts(SecondsFormat::Millis, true),
            })
        })
        .collect();

    let mut meta = Map::new();
    meta.insert("count".to_string(), Value::from(todos.len()));

    JsonApiFormatter.format_list_response("todos", items, Some(meta), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn todo(id: i64, content: &str, is_done: bool) -> Todo {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        Todo {
            id,
            content: content.to_string(),
            is_done,
            created_date: at,
            updated_date: at,
        }
    }

    #[test]
    fn test_render_text() {
        let out = render_text(&[todo(1, "milk", false), todo(12, "bread", true)]);
        assert_eq!(out, "[ ] 1    milk\n[x] 12   bread\n");
        assert_eq!(render_text(&[]), "No todos.\n");
    }

    #[test]
    fn test_render_jsonapi() {
        let doc = render_jsonapi(&[todo(7, "milk", true)]);
        let value = serde_json::to_value(doc).unwrap();
        assert_eq!(value["data"][0]["type"], "todos");
        assert_eq!(value["data"][0]["id"], "7");
        assert_eq!(value["data"][0]["attributes"]["isDone"], true);
        assert_eq!(
            value["data"][0]["attributes"]["createdate"],
            "2024-01-02T03:04:05.000Z"
        );
        assert!(value["data"][0]["attributes"].get("id").is_none());
        assert_eq!(value["meta"]["count"], 1);
    }

    #[test]
    fn test_render_jsonapi_empty() {
        let value = serde_json::to_value(render_jsonapi(&[])).unwrap();
        assert_eq!(value["data"], json!([]));
        assert_eq!(value["meta"]["count"], 0);
    }
}
