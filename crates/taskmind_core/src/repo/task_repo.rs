//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist confirmed tasks and expose the queries the assistant and summary
//!   views need (listing, statistics, reminders).
//!
//! # Invariants
//! - Stored priority is always derived from the flags at insert time.
//! - Read paths call `Task::validate()` and reject unknown enum literals.
//! - `completed_at` is set exactly when status becomes `completed`.

use crate::model::task::{
    FinalTask, GtdTag, Priority, Responsibility, Task, TaskId, TaskStatus, TaskValidationError,
    DATE_FORMAT, REMINDER_FORMAT, TIMESTAMP_FORMAT,
};
use crate::repo::{RepoError, RepoResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Row};
use serde::Serialize;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    project,
    responsibility,
    priority,
    urgency,
    importance,
    gtd_tag,
    due_date,
    reminder_time,
    status,
    created_at,
    completed_at
FROM tasks";

const TASK_ORDER_SQL: &str = "ORDER BY
    CASE status WHEN 'pending' THEN 0 WHEN 'completed' THEN 1 ELSE 2 END,
    priority ASC,
    due_date IS NULL,
    due_date ASC,
    created_at DESC,
    id DESC";

/// Number of projects reported by `TaskStatistics::top_projects`.
pub const TOP_PROJECT_LIMIT: u32 = 10;

/// Aggregate snapshot used by summary replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskStatistics {
    pub total: u64,
    pub pending: u64,
    pub completed: u64,
    pub cancelled: u64,
    /// Pending tasks per quadrant, in `Priority::ALL` order.
    pub pending_by_priority: Vec<(Priority, u64)>,
    /// Pending tasks per GTD tag, in `GtdTag::ALL` order.
    pub pending_by_gtd: Vec<(GtdTag, u64)>,
    /// Busiest projects among pending tasks, count desc then name asc.
    pub top_projects: Vec<(String, u64)>,
}

impl TaskStatistics {
    /// Completed share of all tasks, in percent.
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }

    pub fn pending_in(&self, priority: Priority) -> u64 {
        self.pending_by_priority
            .iter()
            .find(|(candidate, _)| *candidate == priority)
            .map_or(0, |(_, count)| *count)
    }
}

/// Repository interface for confirmed tasks.
pub trait TaskStore {
    fn insert(&self, task: &FinalTask) -> RepoResult<TaskId>;
    fn update_status(&self, id: TaskId, status: TaskStatus) -> RepoResult<()>;
    /// Returns `false` when no row had the id.
    fn delete(&self, id: TaskId) -> RepoResult<bool>;
    fn get(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn get_all(&self) -> RepoResult<Vec<Task>>;
    fn statistics(&self) -> RepoResult<TaskStatistics>;
    /// Pending tasks whose reminder falls on the same minute as `at`.
    fn due_reminders(&self, at: NaiveDateTime) -> RepoResult<Vec<Task>>;

    /// Pending tasks in listing order; ordinals in commands index this list.
    fn pending(&self) -> RepoResult<Vec<Task>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(Task::is_pending)
            .collect())
    }
}

/// SQLite-backed task store.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn count(&self, sql: &str) -> RepoResult<u64> {
        let count = self.conn.query_row(sql, [], |row| row.get::<_, i64>(0))?;
        to_count(count)
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn insert(&self, task: &FinalTask) -> RepoResult<TaskId> {
        if task.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle.into());
        }

        self.conn.execute(
            "INSERT INTO tasks (
                title,
                description,
                project,
                responsibility,
                priority,
                urgency,
                importance,
                gtd_tag,
                due_date,
                reminder_time,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'pending');",
            params![
                task.title.trim(),
                task.description.as_str(),
                task.project.as_str(),
                task.responsibility.as_str(),
                task.priority().value(),
                bool_to_int(task.urgency),
                bool_to_int(task.importance),
                task.gtd_tag.as_str(),
                task.due_date.map(|date| date.format(DATE_FORMAT).to_string()),
                task.reminder_time
                    .map(|time| time.format(REMINDER_FORMAT).to_string()),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_status(&self, id: TaskId, status: TaskStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                status = ?1,
                completed_at = CASE
                    WHEN ?1 = 'completed' THEN strftime('%Y-%m-%d %H:%M:%S', 'now', 'localtime')
                    ELSE NULL
                END
             WHERE id = ?2;",
            params![status.as_str(), id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete(&self, id: TaskId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn get(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn get_all(&self) -> RepoResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} {TASK_ORDER_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn statistics(&self) -> RepoResult<TaskStatistics> {
        let mut stats = TaskStatistics {
            total: self.count("SELECT COUNT(*) FROM tasks;")?,
            pending: self.count("SELECT COUNT(*) FROM tasks WHERE status = 'pending';")?,
            completed: self.count("SELECT COUNT(*) FROM tasks WHERE status = 'completed';")?,
            cancelled: self.count("SELECT COUNT(*) FROM tasks WHERE status = 'cancelled';")?,
            ..TaskStatistics::default()
        };

        for priority in Priority::ALL {
            let count = self.conn.query_row(
                "SELECT COUNT(*) FROM tasks WHERE status = 'pending' AND priority = ?1;",
                [priority.value()],
                |row| row.get::<_, i64>(0),
            )?;
            stats.pending_by_priority.push((priority, to_count(count)?));
        }

        for tag in GtdTag::ALL {
            let count = self.conn.query_row(
                "SELECT COUNT(*) FROM tasks WHERE status = 'pending' AND gtd_tag = ?1;",
                [tag.as_str()],
                |row| row.get::<_, i64>(0),
            )?;
            stats.pending_by_gtd.push((tag, to_count(count)?));
        }

        let mut stmt = self.conn.prepare(
            "SELECT project, COUNT(*) AS task_count
             FROM tasks
             WHERE status = 'pending'
             GROUP BY project
             ORDER BY task_count DESC, project ASC
             LIMIT ?1;",
        )?;
        let mut rows = stmt.query([TOP_PROJECT_LIMIT])?;
        while let Some(row) = rows.next()? {
            let project: String = row.get(0)?;
            stats
                .top_projects
                .push((project, to_count(row.get::<_, i64>(1)?)?));
        }

        Ok(stats)
    }

    fn due_reminders(&self, at: NaiveDateTime) -> RepoResult<Vec<Task>> {
        let minute = at.format(REMINDER_FORMAT).to_string();
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE status = 'pending'
               AND reminder_time = ?1
             {TASK_ORDER_SQL};"
        ))?;
        let mut rows = stmt.query([minute])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let responsibility_text: String = row.get("responsibility")?;
    let responsibility = Responsibility::parse(&responsibility_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid responsibility `{responsibility_text}` in tasks.responsibility"
        ))
    })?;

    let priority_value: i64 = row.get("priority")?;
    let priority = u8::try_from(priority_value)
        .ok()
        .and_then(Priority::from_value)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid priority `{priority_value}` in tasks.priority"
            ))
        })?;

    let gtd_text: String = row.get("gtd_tag")?;
    let gtd_tag = GtdTag::parse(&gtd_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid gtd tag `{gtd_text}` in tasks.gtd_tag"))
    })?;

    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in tasks.status"))
    })?;

    let due_date = match row.get::<_, Option<String>>("due_date")? {
        Some(value) => Some(NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|_| {
            RepoError::InvalidData(format!("invalid due date `{value}` in tasks.due_date"))
        })?),
        None => None,
    };

    let reminder_time = match row.get::<_, Option<String>>("reminder_time")? {
        Some(value) => Some(parse_timestamp(&value, REMINDER_FORMAT, "reminder_time")?),
        None => None,
    };

    let created_at_text: String = row.get("created_at")?;
    let created_at = parse_timestamp(&created_at_text, TIMESTAMP_FORMAT, "created_at")?;

    let completed_at = match row.get::<_, Option<String>>("completed_at")? {
        Some(value) => Some(parse_timestamp(&value, TIMESTAMP_FORMAT, "completed_at")?),
        None => None,
    };

    let task = Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        project: row.get("project")?,
        responsibility,
        priority,
        urgency: int_to_bool(row.get("urgency")?, "urgency")?,
        importance: int_to_bool(row.get("importance")?, "importance")?,
        gtd_tag,
        due_date,
        reminder_time,
        status,
        created_at,
        completed_at,
    };
    task.validate()
        .map_err(|err| RepoError::InvalidData(format!("task {}: {err}", task.id)))?;
    Ok(task)
}

fn parse_timestamp(value: &str, format: &str, column: &str) -> RepoResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, format).map_err(|_| {
        RepoError::InvalidData(format!("invalid timestamp `{value}` in tasks.{column}"))
    })
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in tasks.{column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn to_count(value: i64) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative row count `{value}`")))
}
