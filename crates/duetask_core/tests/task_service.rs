use duetask_core::db::open_db_in_memory;
use duetask_core::{
    NewTask, SqliteTaskRepository, TaskPatch, TaskService, TaskServiceError, TaskValidationError,
};
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

static FAKE_NOW: AtomicI64 = AtomicI64::new(1_000);

fn ticking_clock() -> i64 {
    FAKE_NOW.fetch_add(10, Ordering::SeqCst)
}

#[test]
fn create_rejects_blank_title_and_persists_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteTaskRepository::new(&conn));

    for title in ["", "   ", "\t\n"] {
        let err = service.create_task(&NewTask::new(title)).unwrap_err();
        assert!(matches!(
            err,
            TaskServiceError::Validation(TaskValidationError::EmptyTitle)
        ));
    }
    assert!(service.list_tasks().unwrap().is_empty());
}

#[test]
fn create_assigns_id_and_defaults() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteTaskRepository::new(&conn));

    let created = service
        .create_task(&NewTask::new(" Pay rent ").with_due_at(Some(10)))
        .unwrap();
    assert_eq!(created.title, "Pay rent");
    assert_eq!(created.due_at, Some(10));
    assert!(!created.completed && !created.important && !created.notified);

    let fetched = service.get_task(created.id).unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn list_is_newest_first_with_service_clock() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::with_clock(SqliteTaskRepository::new(&conn), ticking_clock);

    let first = service.create_task(&NewTask::new("first")).unwrap();
    let second = service.create_task(&NewTask::new("second")).unwrap();
    assert!(second.created_at > first.created_at);

    let listed = service.list_tasks().unwrap();
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
}

#[test]
fn update_preserves_fields_missing_from_patch() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::with_clock(SqliteTaskRepository::new(&conn), ticking_clock);

    let created = service
        .create_task(&NewTask {
            title: "Call mom".to_string(),
            important: true,
            due_at: Some(9_999),
            ..NewTask::default()
        })
        .unwrap();

    let updated = service
        .update_task(created.id, &TaskPatch::completed(true))
        .unwrap();
    assert!(updated.completed);
    assert!(updated.important);
    assert_eq!(updated.title, "Call mom");
    assert_eq!(updated.due_at, Some(9_999));
    assert!(!updated.notified);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);

    assert_eq!(service.get_task(created.id).unwrap(), updated);
}

#[test]
fn update_can_clear_due_time_and_rejects_blank_title() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteTaskRepository::new(&conn));
    let created = service
        .create_task(&NewTask::new("stretch").with_due_at(Some(1)))
        .unwrap();

    let cleared = service
        .update_task(
            created.id,
            &TaskPatch {
                due_at: Some(None),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.due_at, None);

    let err = service
        .update_task(
            created.id,
            &TaskPatch {
                title: Some("  ".to_string()),
                ..TaskPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, TaskServiceError::Validation(_)));
    assert_eq!(service.get_task(created.id).unwrap().title, "stretch");
}

#[test]
fn completing_does_not_reset_notified() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteTaskRepository::new(&conn));
    let created = service
        .create_task(&NewTask::new("due soon").with_due_at(Some(1)))
        .unwrap();

    service
        .update_task(created.id, &TaskPatch::notified())
        .unwrap();
    let completed = service
        .update_task(created.id, &TaskPatch::completed(true))
        .unwrap();
    assert!(completed.notified);
}

#[test]
fn update_and_delete_unknown_id_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteTaskRepository::new(&conn));
    service.create_task(&NewTask::new("survivor")).unwrap();
    let missing = Uuid::new_v4();

    let update_err = service
        .update_task(missing, &TaskPatch::important(true))
        .unwrap_err();
    assert!(matches!(update_err, TaskServiceError::NotFound(id) if id == missing));

    let delete_err = service.delete_task(missing).unwrap_err();
    assert!(matches!(delete_err, TaskServiceError::NotFound(id) if id == missing));
    assert_eq!(service.list_tasks().unwrap().len(), 1);
}

#[test]
fn empty_patch_returns_current_task_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteTaskRepository::new(&conn));
    let created = service.create_task(&NewTask::new("noop")).unwrap();

    let same = service
        .update_task(created.id, &TaskPatch::default())
        .unwrap();
    assert_eq!(same, created);
}
