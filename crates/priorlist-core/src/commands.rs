use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use chrono::{Local, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::cli::Command;
use crate::config::{load_sort_pref, save_sort_pref};
use crate::gateway::local::LocalStore;
use crate::render::Renderer;
use crate::repo::TaskRepository;
use crate::screen::TaskScreen;
use crate::session::Session;
use crate::sort::SortMode;
use crate::task::{TaskDraft, TaskPatch};
use crate::validate::{self, FieldErrors, FormData};

#[instrument(skip(store, renderer, session, data_dir, command))]
pub fn dispatch(
    store: Arc<LocalStore>,
    renderer: &mut Renderer,
    session: &mut Session,
    data_dir: &Path,
    command: Command,
) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");

    match command {
        Command::Register { name, email, password } => {
            cmd_register(session, &name, &email, &password)
        }
        Command::Login { email, password } => cmd_login(session, &email, &password),
        Command::Logout => cmd_logout(session),
        Command::Whoami => cmd_whoami(session),
        Command::ResetPassword { email } => cmd_reset_password(session, &email),
        Command::Passwd { password, confirm } => cmd_passwd(session, &password, &confirm),
        Command::List { sort, search, archived } => {
            cmd_list(store, renderer, session, data_dir, sort, search, archived)
        }
        Command::Add { title, description, deadline, priority } => {
            let draft = TaskDraft {
                title,
                description,
                deadline,
                priority,
            };
            cmd_add(store, renderer, session, data_dir, draft)
        }
        Command::Edit {
            id,
            title,
            description,
            deadline,
            clear_deadline,
            priority,
        } => {
            let patch = TaskPatch {
                title,
                description,
                deadline: if clear_deadline {
                    Some(None)
                } else {
                    deadline.map(Some)
                },
                priority,
                completed: None,
                archived: None,
            };
            cmd_edit(store, renderer, session, data_dir, &id, patch)
        }
        Command::Done { id } => cmd_set_completed(store, renderer, session, data_dir, &id, true),
        Command::Undone { id } => cmd_set_completed(store, renderer, session, data_dir, &id, false),
        Command::Archive { id } => cmd_archive(store, renderer, session, data_dir, &id),
        Command::Delete { id, yes } => cmd_delete(store, renderer, session, data_dir, &id, yes),
        Command::ClearArchived => cmd_clear_archived(store, renderer, session, data_dir),
        Command::Sort { mode } => cmd_sort(store, renderer, session, data_dir, mode),
    }
}

fn cmd_register(
    session: &mut Session,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let form = form(&[
        ("name", name),
        ("email", email),
        ("password", password),
        ("confirm_password", password),
    ]);
    check(validate::registration(&form))?;

    let user = session
        .register(name, email, password)
        .ok_or_else(|| auth_error(session, "registration failed"))?;
    println!("Welcome, {}! You are signed in as {}.", user.name, user.email);
    Ok(())
}

fn cmd_login(session: &mut Session, email: &str, password: &str) -> anyhow::Result<()> {
    let form = form(&[("email", email), ("password", password)]);
    check(validate::login(&form))?;

    let user = session
        .login(email, password)
        .ok_or_else(|| auth_error(session, "login failed"))?;
    println!("Signed in as {} <{}>.", user.name, user.email);
    Ok(())
}

fn cmd_logout(session: &mut Session) -> anyhow::Result<()> {
    if session.logout() {
        println!("Signed out.");
        Ok(())
    } else {
        Err(auth_error(session, "sign-out failed"))
    }
}

fn cmd_whoami(session: &Session) -> anyhow::Result<()> {
    match session.user() {
        Some(user) => println!("{} <{}>", user.name, user.email),
        None => println!("Not signed in."),
    }
    Ok(())
}

fn cmd_reset_password(session: &mut Session, email: &str) -> anyhow::Result<()> {
    let form = form(&[("email", email)]);
    check(validate::forgot_password(&form))?;

    if session.request_password_reset(email) {
        println!("Password reset requested for {email}.");
        Ok(())
    } else {
        Err(auth_error(session, "password reset failed"))
    }
}

fn cmd_passwd(session: &mut Session, password: &str, confirm: &str) -> anyhow::Result<()> {
    let form = form(&[("password", password), ("confirm_password", confirm)]);
    check(validate::update_password(&form))?;

    session
        .change_password(password)
        .ok_or_else(|| auth_error(session, "password change failed"))?;
    println!("Password updated.");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_list(
    store: Arc<LocalStore>,
    renderer: &mut Renderer,
    session: &Session,
    data_dir: &Path,
    sort: Option<SortMode>,
    search: Option<String>,
    archived: bool,
) -> anyhow::Result<()> {
    require_user(session)?;
    let mut screen = open_screen(store, session, data_dir)?;

    if let Some(mode) = sort {
        screen.change_sort(session, mode);
        save_sort_pref(data_dir, mode)?;
    }
    if let Some(term) = search {
        screen.set_search_term(term);
    }

    surface_error(&screen)?;

    let today = Local::now().date_naive();
    if archived {
        renderer.print_task_table(&screen.archived_tasks(), today)?;
    } else {
        renderer.print_task_table(&screen.visible_tasks(), today)?;
    }
    Ok(())
}

fn cmd_add(
    store: Arc<LocalStore>,
    renderer: &mut Renderer,
    session: &Session,
    data_dir: &Path,
    draft: TaskDraft,
) -> anyhow::Result<()> {
    let form = form(&[("title", draft.title.as_str())]);
    check(validate::task_form(&form))?;
    require_user(session)?;

    let mut screen = open_screen(store, session, data_dir)?;
    screen.add_task(session, draft, Utc::now());
    flush_toasts(renderer, &mut screen)
}

fn cmd_edit(
    store: Arc<LocalStore>,
    renderer: &mut Renderer,
    session: &Session,
    data_dir: &Path,
    id: &str,
    patch: TaskPatch,
) -> anyhow::Result<()> {
    if patch.is_empty() {
        bail!("nothing to change; pass at least one field");
    }
    if let Some(title) = &patch.title {
        check(validate::task_form(&form(&[("title", title.as_str())])))?;
    }
    require_user(session)?;

    let mut screen = open_screen(store, session, data_dir)?;
    let id = resolve_id(&screen, id)?;
    screen.save_edit(session, id, patch, Utc::now());
    flush_toasts(renderer, &mut screen)
}

fn cmd_set_completed(
    store: Arc<LocalStore>,
    renderer: &mut Renderer,
    session: &Session,
    data_dir: &Path,
    id: &str,
    completed: bool,
) -> anyhow::Result<()> {
    require_user(session)?;
    let mut screen = open_screen(store, session, data_dir)?;
    let id = resolve_id(&screen, id)?;
    screen.set_completed(session, id, completed, Utc::now());
    surface_error(&screen)?;
    flush_toasts(renderer, &mut screen)
}

fn cmd_archive(
    store: Arc<LocalStore>,
    renderer: &mut Renderer,
    session: &Session,
    data_dir: &Path,
    id: &str,
) -> anyhow::Result<()> {
    require_user(session)?;
    let mut screen = open_screen(store, session, data_dir)?;
    let id = resolve_id(&screen, id)?;
    screen.set_archived(session, id, Utc::now());
    flush_toasts(renderer, &mut screen)
}

fn cmd_delete(
    store: Arc<LocalStore>,
    renderer: &mut Renderer,
    session: &Session,
    data_dir: &Path,
    id: &str,
    yes: bool,
) -> anyhow::Result<()> {
    require_user(session)?;
    let mut screen = open_screen(store, session, data_dir)?;
    let id = resolve_id(&screen, id)?;

    screen.request_delete(id);
    if yes {
        screen.confirm_delete(session, Utc::now());
        flush_toasts(renderer, &mut screen)
    } else {
        screen.cancel_delete();
        println!("Deletion is permanent. Re-run with --yes to confirm.");
        Ok(())
    }
}

fn cmd_clear_archived(
    store: Arc<LocalStore>,
    renderer: &mut Renderer,
    session: &Session,
    data_dir: &Path,
) -> anyhow::Result<()> {
    require_user(session)?;
    let mut screen = open_screen(store, session, data_dir)?;
    screen.clear_archived(session, Utc::now());
    flush_toasts(renderer, &mut screen)
}

fn cmd_sort(
    store: Arc<LocalStore>,
    renderer: &mut Renderer,
    session: &Session,
    data_dir: &Path,
    mode: SortMode,
) -> anyhow::Result<()> {
    require_user(session)?;
    let mut screen = open_screen(store, session, data_dir)?;
    screen.change_sort(session, mode);
    surface_error(&screen)?;
    save_sort_pref(data_dir, mode)?;

    println!("Sort order set to {mode}.");
    let today = Local::now().date_naive();
    renderer.print_task_table(&screen.visible_tasks(), today)?;
    Ok(())
}

fn open_screen(
    store: Arc<LocalStore>,
    session: &Session,
    data_dir: &Path,
) -> anyhow::Result<TaskScreen> {
    let sort = load_sort_pref(data_dir);
    let mut screen = TaskScreen::new(TaskRepository::new(store), sort);
    screen.mount(session);
    Ok(screen)
}

fn require_user(session: &Session) -> anyhow::Result<()> {
    if session.user().is_none() {
        bail!("not signed in; run `priorlist login` first");
    }
    Ok(())
}

/// A fetch failure lands in the repository's error field rather than a
/// return value; lift it before rendering stale state.
fn surface_error(screen: &TaskScreen) -> anyhow::Result<()> {
    if let Some(message) = &screen.repo.error {
        bail!("{message}");
    }
    Ok(())
}

fn flush_toasts(renderer: &mut Renderer, screen: &mut TaskScreen) -> anyhow::Result<()> {
    renderer.print_toasts(&screen.toasts.drain())
}

fn auth_error(session: &Session, fallback: &str) -> anyhow::Error {
    anyhow!(
        "{}",
        session.error.clone().unwrap_or_else(|| fallback.to_string())
    )
}

fn form(pairs: &[(&str, &str)]) -> FormData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn check(errors: FieldErrors) -> anyhow::Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    for (field, message) in &errors {
        eprintln!("{field}: {message}");
    }
    bail!("invalid input");
}

/// Resolves a full uuid or an unambiguous prefix against the loaded list.
fn resolve_id(screen: &TaskScreen, raw: &str) -> anyhow::Result<Uuid> {
    if let Ok(id) = raw.parse::<Uuid>() {
        return Ok(id);
    }

    let needle = raw.to_ascii_lowercase();
    let mut matches = screen
        .repo
        .tasks()
        .iter()
        .filter(|t| t.id.to_string().starts_with(&needle));

    let Some(first) = matches.next() else {
        bail!("no task matches id {raw}");
    };
    if matches.next().is_some() {
        bail!("id {raw} is ambiguous");
    }
    debug!(id = %first.id, prefix = %raw, "resolved id prefix");
    Ok(first.id)
}
