//! Assistant facade over router, parser, confirmation, stores and oracle.
//!
//! # Responsibility
//! - Route one utterance and run the matching use case.
//! - Persist confirmed drafts and feed outcomes to memory.
//! - Answer chat with the remote oracle, falling back to offline templates.
//!
//! # Invariants
//! - Parse failures become `NeedsRephrase` replies, never errors.
//! - Oracle failures become offline replies, never errors.
//! - Store failures propagate as `AssistantError::Store`.
//! - Collaborators are fixed at construction; nothing is looked up at runtime.

use crate::model::task::{
    FinalTask, Task, TaskDraft, TaskId, TaskStatus, DATE_FORMAT, REMINDER_FORMAT,
};
use crate::oracle::{ChatOracle, ConversationHistory, OfflineResponder, TaskContext};
use crate::parser::classifier::{classify, reparse, ParseError, RoleContext};
use crate::parser::intent::{extract_task_references, route_intent, Intent, TaskReferences};
use crate::repo::memory_repo::MemoryStore;
use crate::repo::task_repo::TaskStore;
use crate::repo::{RepoError, RepoResult};
use crate::service::confirmation::{ConfirmError, ConfirmationSession, Decision, Resolution};
use crate::service::memory_feedback::{CommittedTask, MemoryFeedback};
use chrono::NaiveDateTime;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CANCEL_WORDS: &[&str] = &["取消"];
const REOPEN_WORDS: &[&str] = &["重新打开", "待办"];
/// Negated completion; these also contain `完成`, so they route as complete.
const NOT_DONE_WORDS: &[&str] = &["未完成", "没完成", "没有完成", "尚未完成"];

#[derive(Debug)]
pub enum AssistantError {
    Store(RepoError),
    Confirm(ConfirmError),
}

impl Display for AssistantError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Confirm(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AssistantError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Confirm(err) => Some(err),
        }
    }
}

impl From<RepoError> for AssistantError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

impl From<ConfirmError> for AssistantError {
    fn from(value: ConfirmError) -> Self {
        Self::Confirm(value)
    }
}

/// Result of one assistant step.
#[derive(Debug)]
pub enum AssistantReply {
    /// A parsed draft waiting for `Assistant::resolve`.
    DraftReady(ConfirmationSession),
    NeedsRephrase { message: String },
    /// Delete/complete/update applied to the listed tasks.
    TasksChanged {
        intent: Intent,
        task_ids: Vec<TaskId>,
        message: String,
    },
    /// A command was recognised but its target or change was unclear.
    NeedsDetail { intent: Intent, message: String },
    Committed {
        task_id: TaskId,
        task: FinalTask,
        message: String,
    },
    Cancelled { message: String },
    Chat { message: String, offline: bool },
}

impl AssistantReply {
    /// User-facing text for this reply.
    pub fn message(&self) -> String {
        match self {
            Self::DraftReady(session) => draft_preview(session.draft()),
            Self::NeedsRephrase { message }
            | Self::TasksChanged { message, .. }
            | Self::NeedsDetail { message, .. }
            | Self::Committed { message, .. }
            | Self::Cancelled { message }
            | Self::Chat { message, .. } => message.clone(),
        }
    }
}

/// Renders the confirmation prompt shown for a fresh draft.
pub fn draft_preview(draft: &TaskDraft) -> String {
    let mut lines = vec![
        "📝 即将添加以下任务，请确认：".to_string(),
        format!("• 标题: {}", draft.title),
        format!("• 优先级: {}", draft.priority().label()),
        format!("• GTD标签: {}", draft.gtd_tag.label()),
        format!("• 项目: {}", draft.project),
    ];
    if let Some(due_date) = draft.due_date {
        lines.push(format!("• 截止日期: {}", due_date.format(DATE_FORMAT)));
    }
    if let Some(reminder_time) = draft.reminder_time {
        lines.push(format!("• 提醒时间: {}", reminder_time.format(REMINDER_FORMAT)));
    }
    lines.push("回复“确认”添加，“修改”调整字段，“重新解析”或“取消”。".to_string());
    lines.join("\n")
}

/// Statically composed assistant.
pub struct Assistant<T: TaskStore, M: MemoryStore, O: ChatOracle> {
    tasks: T,
    memory: MemoryFeedback<M>,
    oracle: O,
    offline: OfflineResponder,
    history: ConversationHistory,
    role_context: RoleContext,
}

impl<T: TaskStore, M: MemoryStore, O: ChatOracle> Assistant<T, M, O> {
    pub fn new(
        tasks: T,
        memory: M,
        oracle: O,
        role_context: RoleContext,
        history_turns: usize,
    ) -> Self {
        Self {
            tasks,
            memory: MemoryFeedback::new(memory),
            oracle,
            offline: OfflineResponder::new(),
            history: ConversationHistory::new(history_turns),
            role_context,
        }
    }

    pub fn tasks(&self) -> &T {
        &self.tasks
    }

    pub fn memory(&self) -> &MemoryFeedback<M> {
        &self.memory
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Profile defaults with confident learned preferences filled in.
    pub fn effective_role_context(&self) -> RoleContext {
        self.role_context
            .clone()
            .with_preference_hints(&self.memory.preference_hints())
    }

    /// Handles one user utterance.
    ///
    /// # Errors
    /// - `AssistantError::Store` when task storage fails.
    pub fn handle(
        &mut self,
        text: &str,
        now: NaiveDateTime,
    ) -> Result<AssistantReply, AssistantError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(AssistantReply::NeedsRephrase {
                message: ParseError::EmptyInput.user_message().to_string(),
            });
        }

        let intent = route_intent(text);
        info!(
            "event=assistant_handle module=assistant status=start intent={} input_chars={}",
            intent.as_str(),
            text.chars().count()
        );

        let reply = match intent {
            Intent::Add => self.draft(text, now),
            Intent::Complete if NOT_DONE_WORDS.iter().any(|word| text.contains(word)) => {
                self.apply_status(text, TaskStatus::Pending)?
            }
            Intent::Delete | Intent::Complete => self.apply_change(text, intent)?,
            Intent::Update => self.apply_update(text)?,
            Intent::Chat => self.chat(text)?,
        };
        Ok(reply)
    }

    /// Applies the user's decision on a draft.
    ///
    /// On a validation error the session stays drafted so the caller can retry.
    /// A store failure leaves it resolved; the caller starts over from `handle`.
    ///
    /// # Errors
    /// - `AssistantError::Confirm` for invalid overrides or a resolved session.
    /// - `AssistantError::Store` when persisting fails.
    pub fn resolve(
        &mut self,
        session: &mut ConfirmationSession,
        decision: Decision,
        now: NaiveDateTime,
    ) -> Result<AssistantReply, AssistantError> {
        let resolution = session.resolve(decision)?;
        let outcome = resolution.outcome();
        let draft = session.draft();

        let reply = match resolution {
            Resolution::Confirmed { task, edited } => {
                let task_id = self.tasks.insert(&task)?;
                self.memory.record_interaction(
                    &draft.source_text,
                    draft,
                    &outcome,
                    Some(CommittedTask { id: task_id, task: &task }),
                );
                info!(
                    "event=task_commit module=assistant status=ok task_id={} priority={} edited_fields={}",
                    task_id,
                    task.priority().value(),
                    edited.len()
                );
                let message = format!(
                    "✅ 已添加任务 ID:{} | {} | {}",
                    task_id,
                    task.title,
                    task.priority().label()
                );
                AssistantReply::Committed {
                    task_id,
                    task,
                    message,
                }
            }
            Resolution::Reparsed { source_text } => {
                self.memory
                    .record_interaction(&source_text, draft, &outcome, None);
                let context = self.effective_role_context();
                match reparse(&source_text, now, &context) {
                    Ok(draft) => AssistantReply::DraftReady(ConfirmationSession::new(draft)),
                    Err(err) => AssistantReply::NeedsRephrase {
                        message: err.user_message().to_string(),
                    },
                }
            }
            Resolution::Cancelled => {
                self.memory
                    .record_interaction(&draft.source_text, draft, &outcome, None);
                AssistantReply::Cancelled {
                    message: "已取消，本次任务未保存。".to_string(),
                }
            }
        };
        Ok(reply)
    }

    fn draft(&self, text: &str, now: NaiveDateTime) -> AssistantReply {
        let context = self.effective_role_context();
        match classify(text, now, &context) {
            Ok(draft) => AssistantReply::DraftReady(ConfirmationSession::new(draft)),
            Err(err) => {
                self.memory
                    .record_exchange(text, Intent::Add, "needs_rephrase", None);
                AssistantReply::NeedsRephrase {
                    message: err.user_message().to_string(),
                }
            }
        }
    }

    fn apply_change(&self, text: &str, intent: Intent) -> Result<AssistantReply, AssistantError> {
        let targets = self.resolve_targets(&extract_task_references(text))?;
        if targets.is_empty() {
            self.memory.record_exchange(text, intent, "needs_detail", None);
            return Ok(AssistantReply::NeedsDetail {
                intent,
                message: "未找到对应的任务，请提供任务ID（如“ID:3”）、序号（如“第2个”）或带引号的标题。"
                    .to_string(),
            });
        }

        let mut changed = Vec::new();
        for id in targets {
            let applied = match intent {
                Intent::Delete => self.tasks.delete(id)?,
                _ => {
                    self.tasks.update_status(id, TaskStatus::Completed)?;
                    true
                }
            };
            if applied {
                changed.push(id);
            }
        }

        let verb = if intent == Intent::Delete { "删除" } else { "完成" };
        let message = format!("✅ 已{}任务: {}", verb, format_ids(&changed));
        self.memory
            .record_exchange(text, intent, "applied", changed.first().copied());
        info!(
            "event=task_change module=assistant status=ok intent={} task_count={}",
            intent.as_str(),
            changed.len()
        );
        Ok(AssistantReply::TasksChanged {
            intent,
            task_ids: changed,
            message,
        })
    }

    fn apply_update(&self, text: &str) -> Result<AssistantReply, AssistantError> {
        let status = if CANCEL_WORDS.iter().any(|word| text.contains(word)) {
            Some(TaskStatus::Cancelled)
        } else if REOPEN_WORDS.iter().any(|word| text.contains(word)) {
            Some(TaskStatus::Pending)
        } else {
            None
        };

        let Some(status) = status else {
            self.memory
                .record_exchange(text, Intent::Update, "needs_detail", None);
            return Ok(AssistantReply::NeedsDetail {
                intent: Intent::Update,
                message: "请说明要如何修改任务：目前支持“取消”或“重新打开”，其它字段请在确认草稿时调整。"
                    .to_string(),
            });
        };
        self.apply_status(text, status)
    }

    fn apply_status(&self, text: &str, status: TaskStatus) -> Result<AssistantReply, AssistantError> {
        let targets = self.resolve_targets(&extract_task_references(text))?;
        if targets.is_empty() {
            self.memory
                .record_exchange(text, Intent::Update, "needs_detail", None);
            return Ok(AssistantReply::NeedsDetail {
                intent: Intent::Update,
                message: "未找到要修改的任务，请提供任务ID或带引号的标题。".to_string(),
            });
        }

        for id in &targets {
            self.tasks.update_status(*id, status)?;
        }
        self.memory
            .record_exchange(text, Intent::Update, "applied", targets.first().copied());
        Ok(AssistantReply::TasksChanged {
            intent: Intent::Update,
            message: format!("✅ 已将任务 {} 设为{}", format_ids(&targets), status_label(status)),
            task_ids: targets,
        })
    }

    fn chat(&mut self, text: &str) -> Result<AssistantReply, AssistantError> {
        let context = TaskContext::new(self.tasks.statistics()?, self.tasks.pending()?);
        let prompt = format!("当前待办事项数据：\n{}\n\n用户指令：{}", context.render(), text);

        let reply = match self.oracle.request(&prompt, &self.history) {
            Ok(message) => {
                self.history.push(text, message.as_str());
                AssistantReply::Chat {
                    message,
                    offline: false,
                }
            }
            Err(err) => {
                warn!(
                    "event=oracle_fallback module=assistant status=degraded error_code={}",
                    err.code()
                );
                AssistantReply::Chat {
                    message: self.offline.reply(text, &context, Some(&err)),
                    offline: true,
                }
            }
        };

        self.memory.record_exchange(text, Intent::Chat, "answered", None);
        Ok(reply)
    }

    /// Resolves references to existing task ids: explicit ids first, then
    /// ordinals over the pending listing, then quoted-title substring matches.
    fn resolve_targets(&self, refs: &TaskReferences) -> RepoResult<Vec<TaskId>> {
        let mut targets = Vec::new();
        for id in &refs.ids {
            if self.tasks.get(*id)?.is_some() && !targets.contains(id) {
                targets.push(*id);
            }
        }

        if refs.ordinals.is_empty() && refs.titles.is_empty() {
            return Ok(targets);
        }

        let pending: Vec<Task> = self.tasks.pending()?;
        for ordinal in &refs.ordinals {
            if let Some(task) = pending.get(ordinal - 1) {
                if !targets.contains(&task.id) {
                    targets.push(task.id);
                }
            }
        }
        for title in &refs.titles {
            if let Some(task) = pending.iter().find(|task| task.title.contains(title.as_str())) {
                if !targets.contains(&task.id) {
                    targets.push(task.id);
                }
            }
        }

        Ok(targets)
    }
}

fn format_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(|id| format!("ID:{id}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "待处理",
        TaskStatus::Completed => "已完成",
        TaskStatus::Cancelled => "已取消",
    }
}
