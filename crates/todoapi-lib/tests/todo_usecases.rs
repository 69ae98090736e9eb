mod common;

use todoapi_lib::{Error, TodoUseCases};

fn usecases() -> TodoUseCases {
    let db = common::memory_db();
    TodoUseCases::new(common::todo_repository(&db))
}

#[test]
fn add_then_get_returns_stored_todo() {
    let todos = usecases();
    let created = todos.add("buy milk").expect("add todo");
    assert!(!created.is_done);
    assert_eq!(created.created_date, created.updated_date);

    let fetched = todos.get(created.id).expect("get todo");
    assert_eq!(fetched, created);
}

#[test]
fn add_trims_and_rejects_blank_content() {
    let todos = usecases();
    assert_eq!(todos.add("  padded  ").unwrap().content, "padded");

    let err = todos.add("   ").unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(todos.list().unwrap().len(), 1);
}

#[test]
fn list_is_ordered_by_id() {
    let todos = usecases();
    for content in ["first", "second", "third"] {
        todos.add(content).unwrap();
    }
    let listed: Vec<String> = todos.list().unwrap().into_iter().map(|t| t.content).collect();
    assert_eq!(listed, vec!["first", "second", "third"]);
}

#[test]
fn update_flips_completion_flag() {
    let todos = usecases();
    let created = todos.add("ship it").unwrap();

    todos.update(created.id, true).unwrap();
    let updated = todos.get(created.id).unwrap();
    assert!(updated.is_done);
    assert!(updated.updated_date >= created.updated_date);

    todos.update(created.id, false).unwrap();
    assert!(!todos.get(created.id).unwrap().is_done);
}

#[test]
fn missing_todo_is_reported_for_every_operation() {
    let todos = usecases();
    assert!(matches!(todos.get(42), Err(Error::TodoNotFound { id: 42 })));
    assert!(matches!(
        todos.update(42, true),
        Err(Error::TodoNotFound { id: 42 })
    ));
    assert!(matches!(todos.delete(42), Err(Error::TodoNotFound { id: 42 })));
}

#[test]
fn delete_removes_todo() {
    let todos = usecases();
    let created = todos.add("temporary").unwrap();
    todos.delete(created.id).unwrap();
    assert!(todos.list().unwrap().is_empty());
}
