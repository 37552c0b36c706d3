use async_trait::async_trait;
use duetask_client::{
    parse_command, tick_and_persist, ClientError, DueWatcher, RecordingNotifier, Shell, TaskApi,
    TaskClient, WatchOptions,
};
use duetask_client::watcher::Clock;
use duetask_core::{NewTask, Task, TaskId, TaskPatch};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const NOW: i64 = 1_700_000_000_000;

/// In-memory backend with a switch that makes every call fail.
#[derive(Default)]
struct FakeApi {
    tasks: Mutex<Vec<Task>>,
    failing: AtomicBool,
    updates: Mutex<Vec<(TaskId, TaskPatch)>>,
}

impl FakeApi {
    fn with_tasks(tasks: Vec<Task>) -> Self {
        let api = Self::default();
        *api.tasks.lock().unwrap() = tasks;
        api
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn stored(&self, id: TaskId) -> Option<Task> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|task| task.id == id)
            .cloned()
    }

    fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), ClientError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Api {
                status: 500,
                message: "task store operation failed".to_string(),
            });
        }
        Ok(())
    }
}

fn not_found(id: TaskId) -> ClientError {
    ClientError::Api {
        status: 404,
        message: format!("task {id} not found"),
    }
}

#[async_trait]
impl TaskApi for FakeApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        self.check()?;
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn create_task(&self, input: &NewTask) -> Result<Task, ClientError> {
        self.check()?;
        let task = Task::from_new(input, NOW);
        self.tasks.lock().unwrap().insert(0, task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, ClientError> {
        self.check()?;
        self.updates.lock().unwrap().push((id, patch.clone()));
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.iter_mut().find(|task| task.id == id).ok_or_else(|| not_found(id))?;
        patch.apply_to(task);
        Ok(task.clone())
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ClientError> {
        self.check()?;
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }
}

struct FixedClock(i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

fn task(title: &str, due_at: Option<i64>) -> Task {
    Task::from_new(&NewTask::new(title).with_due_at(due_at), NOW - 60_000)
}

#[tokio::test]
async fn refresh_then_create_prepends_server_task() {
    let existing = task("existing", None);
    let mut client = TaskClient::new(FakeApi::with_tasks(vec![existing.clone()]));

    assert_eq!(client.refresh().await.unwrap(), 1);
    let created = client.add_task("  Pay rent  ", Some(NOW + 1_000)).await.unwrap();

    assert_eq!(created.title, "Pay rent");
    assert!(!created.completed && !created.important && !created.notified);
    let ids: Vec<TaskId> = client.state().tasks().iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![created.id, existing.id]);
}

#[tokio::test]
async fn blank_title_is_refused_before_any_request() {
    let api = FakeApi::default();
    api.set_failing(true);
    let mut client = TaskClient::new(api);

    let err = client.add_task("   ", None).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert!(client.state().is_empty());
}

#[tokio::test]
async fn failed_calls_leave_state_unchanged() {
    let existing = task("keep me", None);
    let mut client = TaskClient::new(FakeApi::with_tasks(vec![existing.clone()]));
    client.refresh().await.unwrap();
    client.api().set_failing(true);

    assert!(client.refresh().await.is_err());
    assert!(client.add_task("new", None).await.is_err());
    assert!(client.toggle_completed(existing.id).await.is_err());
    assert!(client.delete_task(existing.id).await.is_err());

    assert_eq!(client.state().tasks(), &[existing]);
}

#[tokio::test]
async fn toggles_flip_local_value_and_store_server_copy() {
    let existing = task("flip", None);
    let mut client = TaskClient::new(FakeApi::with_tasks(vec![existing.clone()]));
    client.refresh().await.unwrap();

    let done = client.toggle_completed(existing.id).await.unwrap();
    assert!(done.completed);
    let undone = client.toggle_completed(existing.id).await.unwrap();
    assert!(!undone.completed);
    let starred = client.toggle_important(existing.id).await.unwrap();
    assert!(starred.important);

    assert_eq!(client.state().get(existing.id), Some(&starred));
    assert_eq!(client.api().stored(existing.id), Some(starred));
}

#[tokio::test]
async fn delete_removes_task_and_missing_task_reports_not_found() {
    let existing = task("gone", None);
    let mut client = TaskClient::new(FakeApi::with_tasks(vec![existing.clone()]));
    client.refresh().await.unwrap();

    client.delete_task(existing.id).await.unwrap();
    assert!(client.state().is_empty());

    let err = client.delete_task(existing.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn past_due_task_is_announced_once_and_persisted() {
    let rent = task("Pay rent", Some(NOW - 1_000));
    let mut client = TaskClient::new(FakeApi::with_tasks(vec![rent.clone()]));
    client.refresh().await.unwrap();
    let mut watcher = DueWatcher::new();
    let mut notifier = RecordingNotifier::new();

    let outcome = tick_and_persist(&mut client, &mut watcher, NOW, &mut notifier).await;
    assert_eq!(outcome.fired, vec![rent.id]);
    assert_eq!(outcome.persisted, 1);
    assert!(client.api().stored(rent.id).unwrap().notified);

    for tick in 1..=5 {
        client.refresh().await.unwrap();
        let outcome =
            tick_and_persist(&mut client, &mut watcher, NOW + tick * 1_000, &mut notifier).await;
        assert!(outcome.fired.is_empty());
    }
    assert_eq!(notifier.count_for(rent.id), 1);
    assert_eq!(client.api().update_count(), 1);
}

#[tokio::test]
async fn undated_task_never_fires() {
    let undated = task("someday", None);
    let mut client = TaskClient::new(FakeApi::with_tasks(vec![undated.clone()]));
    client.refresh().await.unwrap();
    let mut watcher = DueWatcher::new();
    let mut notifier = RecordingNotifier::new();

    for tick in 0..10 {
        tick_and_persist(&mut client, &mut watcher, NOW + tick * 1_000, &mut notifier).await;
    }

    assert!(notifier.announced().is_empty());
    assert!(!client.api().stored(undated.id).unwrap().notified);
    assert_eq!(client.api().update_count(), 0);
}

#[tokio::test]
async fn failed_notified_write_keeps_local_mark_without_refiring() {
    let rent = task("Pay rent", Some(NOW - 1_000));
    let mut client = TaskClient::new(FakeApi::with_tasks(vec![rent.clone()]));
    client.refresh().await.unwrap();
    client.api().set_failing(true);
    let mut watcher = DueWatcher::new();
    let mut notifier = RecordingNotifier::new();

    let outcome = tick_and_persist(&mut client, &mut watcher, NOW, &mut notifier).await;
    assert_eq!(outcome.fired.len(), 1);
    assert_eq!(outcome.persisted, 0);
    assert!(client.state().get(rent.id).unwrap().notified);

    tick_and_persist(&mut client, &mut watcher, NOW + 1_000, &mut notifier).await;
    assert_eq!(notifier.announced().len(), 1);
}

#[tokio::test]
async fn shell_edit_saves_title_and_due_through_the_api() {
    let existing = task("old title", Some(NOW + 60_000));
    let mut client = TaskClient::new(FakeApi::with_tasks(vec![existing.clone()]));
    client.refresh().await.unwrap();
    let mut shell = Shell::new(client);
    let mut out = Vec::new();
    let prefix: String = existing.id.to_string().chars().take(6).collect();

    for line in [format!("edit {prefix}"), "title new title".to_string(), "due none".to_string(), "save".to_string()] {
        let command = parse_command(&line).unwrap();
        shell.execute(command, NOW, &mut out).await.unwrap();
    }

    let saved = shell.client().state().get(existing.id).unwrap();
    assert_eq!(saved.title, "new title");
    assert_eq!(saved.due_at, None);
    assert!(shell.edit_session().current().is_none());
    assert!(String::from_utf8(out).unwrap().contains("saved "));
}

#[tokio::test]
async fn shell_failed_save_keeps_draft_and_state() {
    let existing = task("stable", None);
    let mut client = TaskClient::new(FakeApi::with_tasks(vec![existing.clone()]));
    client.refresh().await.unwrap();
    client.api().set_failing(true);
    let mut shell = Shell::new(client);
    let mut out = Vec::new();

    for line in [format!("edit {}", existing.id), "title changed".to_string(), "save".to_string()] {
        shell
            .execute(parse_command(&line).unwrap(), NOW, &mut out)
            .await
            .unwrap();
    }

    assert_eq!(shell.client().state().get(existing.id), Some(&existing));
    assert_eq!(shell.edit_session().current().unwrap().title, "changed");
    assert!(String::from_utf8(out).unwrap().contains("error: server returned 500"));
}

#[tokio::test]
async fn shell_run_processes_commands_until_quit() {
    let client = TaskClient::new(FakeApi::default());
    let mut shell = Shell::new(client);
    let mut out = Vec::new();
    let mut notifier = RecordingNotifier::new();
    let input: &[u8] = b"add Pay rent @+1h\nlist active\nbogus\nquit\nadd never reached\n";

    shell
        .run(
            input,
            &mut out,
            &mut notifier,
            &FixedClock(NOW),
            WatchOptions {
                interval: Duration::from_millis(50),
                refresh_every: 0,
            },
            std::future::pending::<()>(),
        )
        .await
        .unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("added "));
    assert!(printed.contains("My Tasks [active] 1 active, 0 completed"));
    assert!(printed.contains("error: unknown command `bogus`"));
    assert_eq!(shell.client().state().len(), 1);
    assert_eq!(shell.client().state().tasks()[0].due_at, Some(NOW + 3_600_000));
    assert!(notifier.announced().is_empty());
}
