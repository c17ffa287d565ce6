//! Core domain logic for TaskMind.
//!
//! Free-text task intake: command routing, rule-based classification into
//! quadrant priority, GTD tag and project, a confirmation protocol, and a
//! memory feedback loop, backed by SQLite stores and an optional chat backend.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod oracle;
pub mod parser;
pub mod repo;
pub mod service;

pub use config::{load_config, AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{
    default_log_level, init_from_config, init_logging, logging_status, LoggingError, LoggingStatus,
};
pub use model::preference::{KeywordMemory, PreferenceHints, PreferenceSignal};
pub use model::task::{
    FinalTask, GtdTag, Priority, Responsibility, Task, TaskDraft, TaskId, TaskStatus,
};
pub use oracle::{
    ChatOracle, ConversationHistory, HttpChatOracle, OfflineResponder, OracleError, TaskContext,
};
pub use parser::{
    classify, extract_task_references, extract_time, reparse, route_intent, CustomProject,
    Intent, ParseError, RoleContext, TaskReferences, TimeExtraction,
};
pub use repo::memory_repo::{InteractionRecord, MemoryStore, SqliteMemoryStore};
pub use repo::task_repo::{SqliteTaskStore, TaskStatistics, TaskStore};
pub use repo::{RepoError, RepoResult};
pub use service::{
    confirm, Assistant, AssistantError, AssistantReply, ConfirmError, ConfirmationSession,
    Decision, DraftOverrides, InteractionOutcome, MemoryFeedback, Resolution,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
