//! File-backed prototype gateway: the stand-in for the hosted backend during
//! local development, playing the role the original project's mock REST
//! server played. Users and tasks live in JSONL files under the data dir;
//! the active session is a one-line file holding the signed-in user id.

use std::cmp::Ordering;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AuthGateway, TaskGateway, TaskOrder};
use crate::task::{NewTask, Task, TaskPatch, User};

#[derive(Debug)]
pub struct LocalStore {
    pub data_dir: PathBuf,
    users_path: PathBuf,
    tasks_path: PathBuf,
    session_path: PathBuf,
}

/// Prototype-only account record. Credentials are kept in the clear, same as
/// the json-server fixture this store replaces; real deployments talk to the
/// hosted backend instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccountRecord {
    id: Uuid,
    name: String,
    email: String,
    password: String,
}

impl AccountRecord {
    fn as_user(&self) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

impl LocalStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let users_path = data_dir.join("users.data");
        let tasks_path = data_dir.join("tasks.data");
        let session_path = data_dir.join("session.data");

        for path in [&users_path, &tasks_path, &session_path] {
            if !path.exists() {
                fs::write(path, "")?;
            }
        }

        info!(
            data_dir = %data_dir.display(),
            users = %users_path.display(),
            tasks = %tasks_path.display(),
            session = %session_path.display(),
            "opened local store"
        );

        Ok(Self {
            data_dir,
            users_path,
            tasks_path,
            session_path,
        })
    }

    fn load_accounts(&self) -> anyhow::Result<Vec<AccountRecord>> {
        load_jsonl(&self.users_path).context("failed to load users.data")
    }

    fn save_accounts(&self, accounts: &[AccountRecord]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.users_path, accounts).context("failed to save users.data")
    }

    fn load_tasks(&self) -> anyhow::Result<Vec<Task>> {
        load_jsonl(&self.tasks_path).context("failed to load tasks.data")
    }

    fn save_tasks(&self, tasks: &[Task]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.tasks_path, tasks).context("failed to save tasks.data")
    }

    fn session_user_id(&self) -> anyhow::Result<Option<Uuid>> {
        let raw = fs::read_to_string(&self.session_path)
            .with_context(|| format!("failed reading {}", self.session_path.display()))?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let id = trimmed
            .parse::<Uuid>()
            .with_context(|| format!("invalid session id in {}", self.session_path.display()))?;
        Ok(Some(id))
    }

    fn set_session_user_id(&self, id: Option<Uuid>) -> anyhow::Result<()> {
        let payload = id.map(|id| id.to_string()).unwrap_or_default();
        fs::write(&self.session_path, payload)
            .with_context(|| format!("failed writing {}", self.session_path.display()))?;
        Ok(())
    }
}

impl AuthGateway for LocalStore {
    #[tracing::instrument(skip(self, password), fields(email = %email))]
    fn sign_up(&self, name: &str, email: &str, password: &str) -> anyhow::Result<User> {
        let mut accounts = self.load_accounts()?;
        if accounts.iter().any(|a| a.email.eq_ignore_ascii_case(email)) {
            return Err(anyhow!("User already registered"));
        }

        let record = AccountRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let user = record.as_user();
        accounts.push(record);
        self.save_accounts(&accounts)?;
        self.set_session_user_id(Some(user.id))?;

        info!(user_id = %user.id, "registered account");
        Ok(user)
    }

    #[tracing::instrument(skip(self, password), fields(email = %email))]
    fn sign_in_with_password(&self, email: &str, password: &str) -> anyhow::Result<User> {
        let accounts = self.load_accounts()?;
        let record = accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email) && a.password == password)
            .ok_or_else(|| anyhow!("Invalid login credentials"))?;

        self.set_session_user_id(Some(record.id))?;
        info!(user_id = %record.id, "signed in");
        Ok(record.as_user())
    }

    #[tracing::instrument(skip(self))]
    fn sign_out(&self) -> anyhow::Result<()> {
        self.set_session_user_id(None)?;
        info!("signed out");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn get_session(&self) -> anyhow::Result<Option<User>> {
        let Some(id) = self.session_user_id()? else {
            return Ok(None);
        };
        let accounts = self.load_accounts()?;
        Ok(accounts.iter().find(|a| a.id == id).map(AccountRecord::as_user))
    }

    #[tracing::instrument(skip(self), fields(email = %email))]
    fn reset_password_for_email(&self, email: &str) -> anyhow::Result<()> {
        // The hosted backend emails a reset link here. The prototype just
        // verifies the account exists.
        let accounts = self.load_accounts()?;
        if !accounts.iter().any(|a| a.email.eq_ignore_ascii_case(email)) {
            return Err(anyhow!("No account found for {email}"));
        }
        info!("password reset requested");
        Ok(())
    }

    #[tracing::instrument(skip(self, new_password))]
    fn update_user_password(&self, new_password: &str) -> anyhow::Result<User> {
        let id = self
            .session_user_id()?
            .ok_or_else(|| anyhow!("Auth session missing"))?;

        let mut accounts = self.load_accounts()?;
        let record = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| anyhow!("Account not found for active session"))?;
        record.password = new_password.to_string();
        let user = record.as_user();
        self.save_accounts(&accounts)?;

        info!(user_id = %user.id, "password updated");
        Ok(user)
    }
}

impl TaskGateway for LocalStore {
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    fn select_tasks(&self, user_id: Uuid, order: TaskOrder) -> anyhow::Result<Vec<Task>> {
        let mut rows: Vec<Task> = self
            .load_tasks()?
            .into_iter()
            .filter(|t| t.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| order_compare(a, b, order));
        debug!(count = rows.len(), ?order, "selected tasks");
        Ok(rows)
    }

    #[tracing::instrument(skip(self, row), fields(user_id = %row.user_id))]
    fn insert_task(&self, row: NewTask) -> anyhow::Result<Task> {
        let mut tasks = self.load_tasks()?;
        let task = row.into_task(Uuid::new_v4());
        tasks.push(task.clone());
        self.save_tasks(&tasks)?;
        info!(id = %task.id, "inserted task");
        Ok(task)
    }

    #[tracing::instrument(skip(self, patch), fields(id = %id))]
    fn update_task(
        &self,
        id: Uuid,
        patch: &TaskPatch,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Task> {
        let mut tasks = self.load_tasks()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("task not found: {id}"))?;
        patch.apply(task, now);
        let updated = task.clone();
        self.save_tasks(&tasks)?;
        info!(id = %id, "updated task");
        Ok(updated)
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    fn delete_task(&self, id: Uuid) -> anyhow::Result<()> {
        let mut tasks = self.load_tasks()?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(anyhow!("task not found: {id}"));
        }
        self.save_tasks(&tasks)?;
        info!(id = %id, "deleted task");
        Ok(())
    }

    #[tracing::instrument(skip(self, ids))]
    fn delete_tasks(&self, ids: &[Uuid]) -> anyhow::Result<()> {
        let mut tasks = self.load_tasks()?;
        let before = tasks.len();
        tasks.retain(|t| !ids.contains(&t.id));
        self.save_tasks(&tasks)?;
        info!(removed = before - tasks.len(), "bulk-deleted tasks");
        Ok(())
    }
}

fn order_compare(a: &Task, b: &Task, order: TaskOrder) -> Ordering {
    match order {
        TaskOrder::CreatedDesc => b.created_at.cmp(&a.created_at),
        TaskOrder::PriorityAsc => a.priority.code().cmp(&b.priority.code()),
        TaskOrder::TitleAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        TaskOrder::DeadlineAscNullsLast => match (a.deadline, b.deadline) {
            (Some(a_date), Some(b_date)) => a_date.cmp(&b_date),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let row: T = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(row);
    }

    debug!(count = out.len(), "loaded rows from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, rows))]
fn save_jsonl_atomic<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = rows.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for row in rows {
        let serialized = serde_json::to_string(row)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
