//! Task domain model.
//!
//! # Responsibility
//! - Define the draft/final/persisted task records shared by parser, confirmation
//!   and storage.
//! - Own the quadrant mapping between `(importance, urgency)` and `Priority`.
//!
//! # Invariants
//! - `TaskDraft` and `FinalTask` never store a priority; it is always derived
//!   from the two flags via `Priority::from_flags`.
//! - Persisted `Task` rows carry a stored priority that must agree with the
//!   flags (`Task::validate`).
//! - Enum wire literals (`next-action`, `owner`, `pending`, ...) are fixed:
//!   summary/statistics views depend on them verbatim.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned task identifier.
pub type TaskId = i64;

/// Date format used for `due_date` in storage and descriptions.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Minute-precision format used for `reminder_time`.
pub const REMINDER_FORMAT: &str = "%Y-%m-%d %H:%M";
/// Second-precision format used for `created_at` / `completed_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serde adapter writing reminders as `YYYY-MM-DD HH:MM`.
///
/// Reading also accepts second precision so stored rows and older payloads
/// round-trip.
pub mod reminder_format {
    use super::{REMINDER_FORMAT, TIMESTAMP_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&value.format(REMINDER_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid reminder time `{raw}`")))
    }

    /// Parses a reminder in minute or second precision.
    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, REMINDER_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT))
            .ok()
    }
}

/// GTD actionability state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GtdTag {
    NextAction,
    WaitingFor,
    SomedayMaybe,
    /// Fallback when no trigger word matched.
    Inbox,
}

impl GtdTag {
    /// All tags in display order.
    pub const ALL: [GtdTag; 4] = [
        GtdTag::NextAction,
        GtdTag::WaitingFor,
        GtdTag::SomedayMaybe,
        GtdTag::Inbox,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NextAction => "next-action",
            Self::WaitingFor => "waiting-for",
            Self::SomedayMaybe => "someday-maybe",
            Self::Inbox => "inbox",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "next-action" => Some(Self::NextAction),
            "waiting-for" => Some(Self::WaitingFor),
            "someday-maybe" => Some(Self::SomedayMaybe),
            "inbox" => Some(Self::Inbox),
            _ => None,
        }
    }

    /// Human-readable label shown in descriptions and replies.
    pub fn label(self) -> &'static str {
        match self {
            Self::NextAction => "下一步行动",
            Self::WaitingFor => "等待中",
            Self::SomedayMaybe => "将来/也许",
            Self::Inbox => "收件箱",
        }
    }
}

/// The user's stake in a task. Comes from the profile, never from text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Responsibility {
    #[default]
    Owner,
    Participant,
    Observer,
    Supporter,
}

impl Responsibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Participant => "participant",
            Self::Observer => "observer",
            Self::Supporter => "supporter",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(Self::Owner),
            "participant" => Some(Self::Participant),
            "observer" => Some(Self::Observer),
            "supporter" => Some(Self::Supporter),
            _ => None,
        }
    }
}

/// Eisenhower quadrant, stored as `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Priority {
    UrgentImportant = 1,
    ImportantNotUrgent = 2,
    UrgentNotImportant = 3,
    Neither = 4,
}

impl Priority {
    /// All quadrants in numeric order.
    pub const ALL: [Priority; 4] = [
        Priority::UrgentImportant,
        Priority::ImportantNotUrgent,
        Priority::UrgentNotImportant,
        Priority::Neither,
    ];

    /// The only way a priority is produced from classification flags.
    pub fn from_flags(importance: bool, urgency: bool) -> Self {
        match (importance, urgency) {
            (true, true) => Self::UrgentImportant,
            (true, false) => Self::ImportantNotUrgent,
            (false, true) => Self::UrgentNotImportant,
            (false, false) => Self::Neither,
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::UrgentImportant),
            2 => Some(Self::ImportantNotUrgent),
            3 => Some(Self::UrgentNotImportant),
            4 => Some(Self::Neither),
            _ => None,
        }
    }

    /// Quadrant label used by summary views.
    pub fn label(self) -> &'static str {
        match self {
            Self::UrgentImportant => "重要且紧急",
            Self::ImportantNotUrgent => "重要但不紧急",
            Self::UrgentNotImportant => "不重要但紧急",
            Self::Neither => "不重要且不紧急",
        }
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.value()
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| format!("priority must be 1..=4, got {value}"))
    }
}

/// Lifecycle state of a persisted task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Keywords that fired while classifying one input.
///
/// Kept on the draft for audit display and for the keyword-frequency memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSignals {
    pub gtd_keywords: Vec<String>,
    pub importance_keywords: Vec<String>,
    pub urgency_keywords: Vec<String>,
    pub project_keywords: Vec<String>,
    /// Signed importance score; `importance == (importance_score > 0)`.
    pub importance_score: i32,
    /// Signed urgency score including time evidence.
    pub urgency_score: i32,
}

/// Unconfirmed, parser-produced task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub project: String,
    pub responsibility: Responsibility,
    pub importance: bool,
    pub urgency: bool,
    pub gtd_tag: GtdTag,
    pub due_date: Option<NaiveDate>,
    #[serde(default, with = "reminder_format")]
    pub reminder_time: Option<NaiveDateTime>,
    /// Original user text, retained so a reparse never depends on this draft.
    pub source_text: String,
    pub signals: ClassificationSignals,
}

impl TaskDraft {
    /// Quadrant derived from the current flags.
    pub fn priority(&self) -> Priority {
        Priority::from_flags(self.importance, self.urgency)
    }
}

/// Confirmed task handed to the task store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalTask {
    pub title: String,
    pub description: String,
    pub project: String,
    pub responsibility: Responsibility,
    pub importance: bool,
    pub urgency: bool,
    pub gtd_tag: GtdTag,
    pub due_date: Option<NaiveDate>,
    #[serde(default, with = "reminder_format")]
    pub reminder_time: Option<NaiveDateTime>,
}

impl FinalTask {
    pub fn priority(&self) -> Priority {
        Priority::from_flags(self.importance, self.urgency)
    }
}

/// Persisted task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub project: String,
    pub responsibility: Responsibility,
    pub priority: Priority,
    pub urgency: bool,
    pub importance: bool,
    pub gtd_tag: GtdTag,
    pub due_date: Option<NaiveDate>,
    #[serde(default, with = "reminder_format")]
    pub reminder_time: Option<NaiveDateTime>,
    pub status: TaskStatus,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

/// Validation failures for persisted task rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Stored priority disagrees with the stored flags.
    PriorityMismatch {
        stored: Priority,
        derived: Priority,
    },
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PriorityMismatch { stored, derived } => write!(
                f,
                "priority {} does not match importance/urgency (expected {})",
                stored.value(),
                derived.value()
            ),
            Self::EmptyTitle => write!(f, "task title must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

impl Task {
    /// Checks invariants that persisted rows must satisfy.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        let derived = Priority::from_flags(self.importance, self.urgency);
        if derived != self.priority {
            return Err(TaskValidationError::PriorityMismatch {
                stored: self.priority,
                derived,
            });
        }
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}
