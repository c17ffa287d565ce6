//! Rule-based task classification.
//!
//! # Responsibility
//! - Turn one free-text sentence into a `TaskDraft`.
//! - Combine keyword hits into GTD tag, importance/urgency, project and
//!   due/reminder fields with deterministic tie-breaks.
//!
//! # Invariants
//! - Pure function of `(text, now, role_context)`: no clock reads, no I/O, no
//!   hidden state. Safe to call from any thread.
//! - Title extraction (and empty input) are the only failures; every other
//!   field falls back to a default.
//! - GTD precedence is next-action > waiting-for > someday-maybe > inbox.
//! - Negative phrases are counted first and masked, so `不重要` never also
//!   scores as `重要`.

use crate::model::preference::{
    PreferenceHints, PREFERRED_PROJECT_KEY, PREFERRED_RESPONSIBILITY_KEY,
};
use crate::model::task::{
    ClassificationSignals, GtdTag, Priority, Responsibility, TaskDraft, DATE_FORMAT,
    REMINDER_FORMAT,
};
use crate::parser::keywords::{
    matching, ScoreTable, FALLBACK_PROJECT, GTD_TABLE, IMPORTANCE_TABLE, NEAR_DUE_WEIGHT,
    NEGATIVE_WEIGHT, ORDINARY_WEIGHT, PROJECT_TABLE, SHORT_WINDOW_WEIGHT, STRONG_WEIGHT,
    URGENCY_TABLE,
};
use crate::parser::time_extract::{extract_time, TimeExtraction};
use crate::parser::title::extract_title;
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum hint confidence before a learned preference fills a profile default.
pub const HINT_MIN_CONFIDENCE: f64 = 0.6;

static SHORT_WINDOW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\s*(?:个)?(?:小时|分钟)内").expect("valid window regex"));

/// User-defined project with its own trigger words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomProject {
    pub id: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Caller-supplied profile defaults consulted by `classify`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleContext {
    pub default_project: Option<String>,
    pub default_responsibility: Option<Responsibility>,
    /// Checked before the built-in project table.
    #[serde(default)]
    pub custom_projects: Vec<CustomProject>,
}

impl RoleContext {
    /// Fills unset defaults from sufficiently confident learned preferences.
    ///
    /// Explicit profile values are never replaced. The result is an ordinary
    /// context, so `classify` stays deterministic for a given context.
    pub fn with_preference_hints(mut self, hints: &PreferenceHints) -> Self {
        if self.default_project.is_none() {
            self.default_project = hints
                .confident_value(PREFERRED_PROJECT_KEY, HINT_MIN_CONFIDENCE)
                .map(str::to_string);
        }
        if self.default_responsibility.is_none() {
            self.default_responsibility = hints
                .confident_value(PREFERRED_RESPONSIBILITY_KEY, HINT_MIN_CONFIDENCE)
                .and_then(Responsibility::parse);
        }
        self
    }
}

/// Classification failure surfaced to the caller as a rephrase prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    EmptyInput,
    /// Nothing meaningful remained after stripping command/priority/date words.
    TitleExtraction { input_chars: usize },
}

impl ParseError {
    /// Prompt shown to the user instead of creating a malformed task.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyInput => "请输入任务内容。",
            Self::TitleExtraction { .. } => {
                "无法从输入中解析出任务标题，请换一种说法，例如“明天下午3点提交周报”。"
            }
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "input is empty"),
            Self::TitleExtraction { input_chars } => write!(
                f,
                "cannot extract a task title from {input_chars}-character input"
            ),
        }
    }
}

impl Error for ParseError {}

/// Classifies free text into a task draft.
///
/// # Errors
/// - `ParseError::EmptyInput` for blank input.
/// - `ParseError::TitleExtraction` when the derived title is too short.
pub fn classify(
    text: &str,
    now: NaiveDateTime,
    role_context: &RoleContext,
) -> Result<TaskDraft, ParseError> {
    let source_text = text.trim();
    let input_chars = source_text.chars().count();
    if source_text.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let Some(title) = extract_title(source_text) else {
        info!(
            "event=task_classify module=parser status=rejected error_code=title_extraction_failed input_chars={}",
            input_chars
        );
        return Err(ParseError::TitleExtraction { input_chars });
    };

    let lowered = source_text.to_lowercase();
    let (gtd_tag, gtd_keywords) = resolve_gtd_tag(&lowered);
    let time = extract_time(source_text, now);

    let (importance_score, importance_keywords) = score(&lowered, &IMPORTANCE_TABLE);
    let (keyword_urgency, urgency_keywords) = score(&lowered, &URGENCY_TABLE);
    let urgency_score = keyword_urgency + time_evidence(&lowered, &time, now.date());

    let importance = importance_score > 0;
    let urgency = urgency_score > 0;
    let (project, project_keywords) = resolve_project(&lowered, role_context);
    let responsibility = role_context.default_responsibility.unwrap_or_default();

    let description = render_description(
        source_text,
        gtd_tag,
        Priority::from_flags(importance, urgency),
        &project,
        time.due_date,
        time.reminder_time,
    );

    debug!(
        "event=task_classify module=parser status=ok input_chars={} gtd_tag={} priority={} importance_score={} urgency_score={} has_due_date={} has_reminder={}",
        input_chars,
        gtd_tag.as_str(),
        Priority::from_flags(importance, urgency).value(),
        importance_score,
        urgency_score,
        time.due_date.is_some(),
        time.reminder_time.is_some()
    );

    Ok(TaskDraft {
        title,
        description,
        project,
        responsibility,
        importance,
        urgency,
        gtd_tag,
        due_date: time.due_date,
        reminder_time: time.reminder_time,
        source_text: source_text.to_string(),
        signals: ClassificationSignals {
            gtd_keywords,
            importance_keywords,
            urgency_keywords,
            project_keywords,
            importance_score,
            urgency_score,
        },
    })
}

/// Re-runs classification on retained source text.
///
/// Identical to `classify`; named separately so call sites read as a retry
/// after the user rejected a draft.
pub fn reparse(
    text: &str,
    now: NaiveDateTime,
    role_context: &RoleContext,
) -> Result<TaskDraft, ParseError> {
    classify(text, now, role_context)
}

/// Renders the audit description attached to drafts and final tasks.
pub fn render_description(
    source_text: &str,
    gtd_tag: GtdTag,
    priority: Priority,
    project: &str,
    due_date: Option<NaiveDate>,
    reminder_time: Option<NaiveDateTime>,
) -> String {
    let mut lines = vec![
        format!("原始输入: {source_text}"),
        String::new(),
        "智能解析结果:".to_string(),
        format!("- GTD标签: {}", gtd_tag.label()),
        format!("- 优先级: {}", priority.label()),
        format!("- 项目: {project}"),
    ];
    if let Some(due_date) = due_date {
        lines.push(format!("- 截止日期: {}", due_date.format(DATE_FORMAT)));
    }
    if let Some(reminder_time) = reminder_time {
        lines.push(format!("- 提醒时间: {}", reminder_time.format(REMINDER_FORMAT)));
    }
    lines.join("\n")
}

fn resolve_gtd_tag(lowered: &str) -> (GtdTag, Vec<String>) {
    for (tag, triggers) in GTD_TABLE {
        let hits = matching(lowered, triggers);
        if !hits.is_empty() {
            return (*tag, to_owned_all(&hits));
        }
    }
    (GtdTag::Inbox, Vec::new())
}

fn score(lowered: &str, table: &ScoreTable) -> (i32, Vec<String>) {
    let mut masked = lowered.to_string();
    let mut total = 0;
    let mut hits = Vec::new();

    for keyword in table.negative {
        if masked.contains(keyword) {
            total += NEGATIVE_WEIGHT;
            hits.push((*keyword).to_string());
            masked = masked.replace(keyword, " ");
        }
    }
    for (keywords, weight) in [
        (table.strong, STRONG_WEIGHT),
        (table.ordinary, ORDINARY_WEIGHT),
    ] {
        for keyword in matching(&masked, keywords) {
            total += weight;
            hits.push(keyword.to_string());
        }
    }

    (total, hits)
}

fn time_evidence(lowered: &str, time: &TimeExtraction, today: NaiveDate) -> i32 {
    let mut evidence = 0;
    if matches!(time.days_until_due(today), Some(0..=1)) {
        evidence += NEAR_DUE_WEIGHT;
    }
    if SHORT_WINDOW_RE.is_match(lowered) {
        evidence += SHORT_WINDOW_WEIGHT;
    }
    evidence
}

fn resolve_project(lowered: &str, role_context: &RoleContext) -> (String, Vec<String>) {
    for project in &role_context.custom_projects {
        let hit = std::iter::once(&project.id)
            .chain(project.keywords.iter())
            .map(|keyword| keyword.trim().to_lowercase())
            .find(|keyword| keyword.chars().count() > 1 && lowered.contains(keyword.as_str()));
        if let Some(keyword) = hit {
            return (project.id.clone(), vec![keyword]);
        }
    }

    for (project_id, keywords) in PROJECT_TABLE {
        let hits = matching(lowered, keywords);
        if !hits.is_empty() {
            return ((*project_id).to_string(), to_owned_all(&hits));
        }
    }

    let fallback = role_context
        .default_project
        .as_deref()
        .map(str::trim)
        .filter(|project| !project.is_empty())
        .unwrap_or(FALLBACK_PROJECT);
    (fallback.to_string(), Vec::new())
}

fn to_owned_all(hits: &[&str]) -> Vec<String> {
    hits.iter().map(|hit| (*hit).to_string()).collect()
}
