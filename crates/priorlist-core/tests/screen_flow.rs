use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use priorlist_core::gateway::AuthGateway;
use priorlist_core::gateway::local::LocalStore;
use priorlist_core::repo::TaskRepository;
use priorlist_core::screen::TaskScreen;
use priorlist_core::session::Session;
use priorlist_core::sort::SortMode;
use priorlist_core::task::{Priority, TaskDraft, TaskPatch};
use tempfile::tempdir;

fn draft(title: &str, priority: Priority, deadline: Option<NaiveDate>) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        description: String::new(),
        deadline,
        priority,
    }
}

#[test]
fn full_task_lifecycle_through_the_screen() {
    let temp = tempdir().expect("tempdir");
    let store = Arc::new(LocalStore::open(temp.path()).expect("open store"));
    store
        .sign_up("Ana", "ana@example.com", "Abc123!")
        .expect("sign up");
    let session = Session::restore(store.clone());
    assert!(session.user().is_some());

    let mut screen = TaskScreen::new(TaskRepository::new(store.clone()), SortMode::Default);
    screen.mount(&session);
    assert!(screen.visible_tasks().is_empty());

    let now = Utc::now();
    screen.add_task(&session, draft("Buy milk", Priority::Low, None), now);
    screen.add_task(
        &session,
        draft(
            "File taxes",
            Priority::High,
            NaiveDate::from_ymd_opt(2026, 4, 15),
        ),
        now,
    );
    assert_eq!(screen.visible_tasks().len(), 2);

    // Urgent ordering puts the high-priority task first.
    screen.change_sort(&session, SortMode::Urgents);
    assert_eq!(screen.visible_tasks()[0].title, "File taxes");

    // Complete, archive, then hide from the main list.
    let milk = screen
        .repo
        .tasks()
        .iter()
        .find(|t| t.title == "Buy milk")
        .map(|t| t.id)
        .expect("task present");
    screen.set_completed(&session, milk, true, now);
    screen.set_archived(&session, milk, now);
    assert_eq!(screen.visible_tasks().len(), 1);
    assert_eq!(screen.archived_tasks().len(), 1);

    // Edits survive the authoritative re-fetch.
    let taxes = screen.repo.tasks()[0].id;
    let patch = TaskPatch {
        title: Some("File taxes early".to_string()),
        ..TaskPatch::default()
    };
    screen.save_edit(&session, taxes, patch, now);
    assert!(screen.repo.tasks().iter().any(|t| t.title == "File taxes early"));

    // Clearing the archive deletes exactly the archived tasks.
    screen.clear_archived(&session, now);
    assert!(screen.archived_tasks().is_empty());
    assert_eq!(screen.repo.tasks().len(), 1);

    // Deleted tasks stay deleted across a fresh fetch.
    screen.request_delete(taxes);
    screen.confirm_delete(&session, now);
    assert!(screen.repo.tasks().is_empty());
    screen.mount(&session);
    assert!(screen.repo.tasks().is_empty());
}

#[test]
fn repository_state_is_scoped_to_the_signed_in_user() {
    let temp = tempdir().expect("tempdir");
    let store = Arc::new(LocalStore::open(temp.path()).expect("open store"));

    store
        .sign_up("Ana", "ana@example.com", "Abc123!")
        .expect("sign up ana");
    let ana = Session::restore(store.clone());
    let mut ana_repo = TaskRepository::new(store.clone());
    ana_repo.create(
        &ana,
        draft("Ana's task", Priority::Medium, None),
        SortMode::Default,
        Utc::now(),
    );

    store
        .sign_up("Bo", "bo@example.com", "Xyz789!")
        .expect("sign up bo");
    let bo = Session::restore(store.clone());
    let mut bo_repo = TaskRepository::new(store.clone());
    bo_repo.fetch(&bo, SortMode::Default);

    assert!(bo_repo.tasks().is_empty());
    assert_eq!(ana_repo.tasks().len(), 1);
}

#[test]
fn session_flows_cover_login_logout_and_failure() {
    let temp = tempdir().expect("tempdir");
    let store = Arc::new(LocalStore::open(temp.path()).expect("open store"));
    store
        .sign_up("Ana", "ana@example.com", "Abc123!")
        .expect("sign up");

    let mut session = Session::restore(store.clone());
    assert!(session.logout());
    assert!(session.user().is_none());

    assert!(session.login("ana@example.com", "wrong!").is_none());
    assert_eq!(session.error.as_deref(), Some("Invalid login credentials"));

    let user = session
        .login("ana@example.com", "Abc123!")
        .expect("login should succeed");
    assert_eq!(user.email, "ana@example.com");
    assert!(session.error.is_none());

    // A signed-out session makes every repository operation a silent no-op.
    session.logout();
    let mut repo = TaskRepository::new(store);
    let created = repo.create(
        &session,
        draft("ghost", Priority::Low, None),
        SortMode::Default,
        Utc::now(),
    );
    assert!(created.is_none());
    assert!(repo.tasks().is_empty());
}
