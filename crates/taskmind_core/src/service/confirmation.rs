//! Draft confirmation and override protocol.
//!
//! # Responsibility
//! - Turn a parser draft into a `FinalTask` after the user accepts or edits it.
//! - Model the accept/edit/reparse/cancel choice as an explicit state machine.
//!
//! # Invariants
//! - Priority is never overridden directly; it is recomputed from the final
//!   importance/urgency flags.
//! - A session resolves at most once. Validation failures leave it drafted so
//!   the caller can retry with different overrides.
//! - Final titles are non-empty after trimming; reminders require a due date.
//! - Moving the due date keeps the reminder's time of day on the new date;
//!   clearing the due date clears the reminder unless one is given explicitly.

use crate::model::task::{
    reminder_format, FinalTask, GtdTag, Responsibility, TaskDraft,
};
use crate::parser::classifier::render_description;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field-level replacements supplied by the user on confirmation.
///
/// Unknown JSON keys (including `priority`) are ignored on deserialization.
/// `due_date` and `reminder_time` are tri-state: a missing key keeps the
/// draft value, `null` clears it, a value replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftOverrides {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project: Option<String>,
    pub responsibility: Option<Responsibility>,
    pub importance: Option<bool>,
    pub urgency: Option<bool>,
    pub gtd_tag: Option<GtdTag>,
    #[serde(
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(
        deserialize_with = "deserialize_reminder_present",
        serialize_with = "serialize_reminder_override",
        skip_serializing_if = "Option::is_none"
    )]
    pub reminder_time: Option<Option<NaiveDateTime>>,
}

fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn deserialize_reminder_present<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<NaiveDateTime>>, D::Error> {
    reminder_format::deserialize(deserializer).map(Some)
}

fn serialize_reminder_override<S: Serializer>(
    value: &Option<Option<NaiveDateTime>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    reminder_format::serialize(&value.flatten(), serializer)
}

impl DraftOverrides {
    /// Due date and reminder after applying the overrides to `draft`.
    pub fn resolved_schedule(
        &self,
        draft: &TaskDraft,
    ) -> (Option<NaiveDate>, Option<NaiveDateTime>) {
        let due_date = self.due_date.unwrap_or(draft.due_date);
        let reminder_time = match (self.reminder_time, self.due_date) {
            (Some(reminder), _) => reminder,
            (None, Some(Some(new_due))) => draft
                .reminder_time
                .map(|reminder| new_due.and_time(reminder.time())),
            (None, Some(None)) => None,
            (None, None) => draft.reminder_time,
        };
        (due_date, reminder_time)
    }

    /// Names of fields whose override differs from the draft value.
    pub fn changed_fields(&self, draft: &TaskDraft) -> Vec<String> {
        let mut changed = Vec::new();
        let mut mark = |name: &str, differs: bool| {
            if differs {
                changed.push(name.to_string());
            }
        };
        mark(
            "title",
            self.title
                .as_deref()
                .is_some_and(|title| title.trim() != draft.title),
        );
        mark(
            "description",
            self.description
                .as_deref()
                .is_some_and(|description| description != draft.description),
        );
        mark(
            "project",
            self.project
                .as_deref()
                .map(str::trim)
                .is_some_and(|project| !project.is_empty() && project != draft.project),
        );
        mark(
            "responsibility",
            self.responsibility
                .is_some_and(|value| value != draft.responsibility),
        );
        mark(
            "importance",
            self.importance.is_some_and(|value| value != draft.importance),
        );
        mark(
            "urgency",
            self.urgency.is_some_and(|value| value != draft.urgency),
        );
        mark(
            "gtd_tag",
            self.gtd_tag.is_some_and(|value| value != draft.gtd_tag),
        );
        let (due_date, reminder_time) = self.resolved_schedule(draft);
        mark("due_date", due_date != draft.due_date);
        mark("reminder_time", reminder_time != draft.reminder_time);
        changed
    }
}

/// Validation failure while building or resolving a final task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmError {
    EmptyTitle,
    ReminderWithoutDueDate,
    AlreadyResolved,
}

impl Display for ConfirmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be empty"),
            Self::ReminderWithoutDueDate => write!(f, "reminder time requires a due date"),
            Self::AlreadyResolved => write!(f, "confirmation session is already resolved"),
        }
    }
}

impl Error for ConfirmError {}

/// Builds a final task from a draft plus optional overrides.
///
/// # Errors
/// - `ConfirmError::EmptyTitle` when the final title is blank.
/// - `ConfirmError::ReminderWithoutDueDate` when a reminder has no due date.
pub fn confirm(
    draft: &TaskDraft,
    overrides: Option<&DraftOverrides>,
) -> Result<FinalTask, ConfirmError> {
    let Some(overrides) = overrides else {
        return finalize(draft.clone().into());
    };

    let changed = overrides.changed_fields(draft);
    let (due_date, reminder_time) = overrides.resolved_schedule(draft);
    let project = overrides
        .project
        .as_deref()
        .map(str::trim)
        .filter(|project| !project.is_empty())
        .unwrap_or(&draft.project)
        .to_string();

    let mut task = FinalTask {
        title: overrides
            .title
            .as_deref()
            .unwrap_or(&draft.title)
            .trim()
            .to_string(),
        description: String::new(),
        project,
        responsibility: overrides.responsibility.unwrap_or(draft.responsibility),
        importance: overrides.importance.unwrap_or(draft.importance),
        urgency: overrides.urgency.unwrap_or(draft.urgency),
        gtd_tag: overrides.gtd_tag.unwrap_or(draft.gtd_tag),
        due_date,
        reminder_time,
    };

    task.description = match &overrides.description {
        Some(description) => description.clone(),
        None if changed.is_empty() => draft.description.clone(),
        None => {
            let rendered = render_description(
                &draft.source_text,
                task.gtd_tag,
                task.priority(),
                &task.project,
                task.due_date,
                task.reminder_time,
            );
            format!("{rendered}\n- 用户修改: {}", changed.join(", "))
        }
    };

    finalize(task)
}

fn finalize(task: FinalTask) -> Result<FinalTask, ConfirmError> {
    if task.title.trim().is_empty() {
        return Err(ConfirmError::EmptyTitle);
    }
    if task.reminder_time.is_some() && task.due_date.is_none() {
        return Err(ConfirmError::ReminderWithoutDueDate);
    }
    Ok(task)
}

impl From<TaskDraft> for FinalTask {
    fn from(draft: TaskDraft) -> Self {
        Self {
            title: draft.title,
            description: draft.description,
            project: draft.project,
            responsibility: draft.responsibility,
            importance: draft.importance,
            urgency: draft.urgency,
            gtd_tag: draft.gtd_tag,
            due_date: draft.due_date,
            reminder_time: draft.reminder_time,
        }
    }
}

/// User choice on a pending draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Edit(DraftOverrides),
    Reparse,
    Cancel,
}

/// Terminal result of a confirmation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// `edited` lists the fields the user changed; empty for a verbatim accept.
    Confirmed { task: FinalTask, edited: Vec<String> },
    /// The caller re-runs classification on `source_text`.
    Reparsed { source_text: String },
    Cancelled,
}

impl Resolution {
    pub fn outcome(&self) -> InteractionOutcome {
        match self {
            Self::Confirmed { edited, .. } if edited.is_empty() => InteractionOutcome::Confirmed,
            Self::Confirmed { edited, .. } => InteractionOutcome::Edited {
                changed_fields: edited.clone(),
            },
            Self::Reparsed { .. } => InteractionOutcome::Reparsed,
            Self::Cancelled => InteractionOutcome::Cancelled,
        }
    }
}

/// What happened to a draft, as fed to the memory feedback loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionOutcome {
    Confirmed,
    Edited { changed_fields: Vec<String> },
    Reparsed,
    Cancelled,
}

impl InteractionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Edited { .. } => "edited",
            Self::Reparsed => "reparsed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the draft ended up as a persisted task.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Edited { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Drafted,
    Resolved,
}

/// One draft awaiting the user's decision.
#[derive(Debug, Clone)]
pub struct ConfirmationSession {
    draft: TaskDraft,
    state: SessionState,
}

impl ConfirmationSession {
    pub fn new(draft: TaskDraft) -> Self {
        Self {
            draft,
            state: SessionState::Drafted,
        }
    }

    pub fn draft(&self) -> &TaskDraft {
        &self.draft
    }

    pub fn is_resolved(&self) -> bool {
        self.state == SessionState::Resolved
    }

    /// Applies the user's decision.
    ///
    /// # Errors
    /// - `ConfirmError::AlreadyResolved` on a second resolution.
    /// - Validation errors from `confirm`; the session stays drafted.
    pub fn resolve(&mut self, decision: Decision) -> Result<Resolution, ConfirmError> {
        if self.is_resolved() {
            return Err(ConfirmError::AlreadyResolved);
        }

        let resolution = match decision {
            Decision::Accept => Resolution::Confirmed {
                task: confirm(&self.draft, None)?,
                edited: Vec::new(),
            },
            Decision::Edit(overrides) => Resolution::Confirmed {
                task: confirm(&self.draft, Some(&overrides))?,
                edited: overrides.changed_fields(&self.draft),
            },
            Decision::Reparse => Resolution::Reparsed {
                source_text: self.draft.source_text.clone(),
            },
            Decision::Cancel => Resolution::Cancelled,
        };

        self.state = SessionState::Resolved;
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::{confirm, ConfirmError, DraftOverrides};
    use crate::model::task::{ClassificationSignals, GtdTag, Responsibility, TaskDraft};
    use chrono::NaiveDate;

    fn draft() -> TaskDraft {
        TaskDraft {
            title: "提交周报".to_string(),
            description: "原始输入: 提交周报".to_string(),
            project: "work".to_string(),
            responsibility: Responsibility::Owner,
            importance: true,
            urgency: true,
            gtd_tag: GtdTag::Inbox,
            due_date: None,
            reminder_time: None,
            source_text: "提交周报".to_string(),
            signals: ClassificationSignals::default(),
        }
    }

    #[test]
    fn blank_project_override_keeps_draft_project() {
        let overrides = DraftOverrides {
            project: Some("  ".to_string()),
            ..DraftOverrides::default()
        };
        assert!(overrides.changed_fields(&draft()).is_empty());
        assert_eq!(confirm(&draft(), Some(&overrides)).unwrap().project, "work");
    }

    #[test]
    fn reminder_requires_due_date() {
        let overrides = DraftOverrides {
            reminder_time: Some(
                NaiveDate::from_ymd_opt(2024, 1, 2)
                    .unwrap()
                    .and_hms_opt(9, 0, 0),
            ),
            ..DraftOverrides::default()
        };
        assert_eq!(
            confirm(&draft(), Some(&overrides)),
            Err(ConfirmError::ReminderWithoutDueDate)
        );
    }

    #[test]
    fn edited_description_lists_changed_fields() {
        let overrides = DraftOverrides {
            importance: Some(false),
            ..DraftOverrides::default()
        };
        let task = confirm(&draft(), Some(&overrides)).unwrap();
        assert!(task.description.contains("用户修改: importance"));
        assert!(task.description.contains("- 优先级: 不重要但紧急"));
    }
}
