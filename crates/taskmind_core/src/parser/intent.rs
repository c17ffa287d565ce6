//! Command intent routing and task-reference extraction.
//!
//! # Invariants
//! - Routing is a first-match scan in the order add, delete, complete, update;
//!   anything else is chat.
//! - Reference lists keep first-occurrence order and contain no duplicates.
//! - Bare numbers count as ids only when no explicit id or ordinal was found.

use crate::model::task::TaskId;
use crate::parser::keywords::{ADD_VERBS, COMPLETE_VERBS, DELETE_VERBS, UPDATE_VERBS};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Coarse command category of one user utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Add,
    Delete,
    Complete,
    Update,
    Chat,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Complete => "complete",
            Self::Update => "update",
            Self::Chat => "chat",
        }
    }
}

const INTENT_TABLE: &[(Intent, &[&str])] = &[
    (Intent::Add, ADD_VERBS),
    (Intent::Delete, DELETE_VERBS),
    (Intent::Complete, COMPLETE_VERBS),
    (Intent::Update, UPDATE_VERBS),
];

static EXPLICIT_ID_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)id\s*[:：]?\s*(\d+)",
        r"任务\s*(\d+)",
        r"编号\s*[:：]?\s*(\d+)",
        r"#\s*(\d+)",
        r"(?:删除|移除|去掉|清除|完成|做完|结束)\s*(\d+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid task id regex"))
    .collect()
});
static ORDINAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"第\s*(\d+|[一二三四五六七八九十])\s*[个条项]").expect("valid ordinal regex")
});
static BARE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("valid bare number regex"));
static QUOTED_TITLE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#""([^"]+)""#,
        r"'([^']+)'",
        r"“([^”]+)”",
        r"《([^》]+)》",
        r"【([^】]+)】",
        r"「([^」]+)」",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid quoted title regex"))
    .collect()
});

/// Task references found in one command utterance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReferences {
    pub ids: Vec<TaskId>,
    /// 1-based positions in the caller's pending-task listing.
    pub ordinals: Vec<usize>,
    pub titles: Vec<String>,
}

impl TaskReferences {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.ordinals.is_empty() && self.titles.is_empty()
    }
}

/// Routes raw text to a command intent.
pub fn route_intent(text: &str) -> Intent {
    INTENT_TABLE
        .iter()
        .find(|(_, verbs)| verbs.iter().any(|verb| text.contains(verb)))
        .map_or(Intent::Chat, |(intent, _)| *intent)
}

/// Extracts ids, ordinals and quoted titles from a command utterance.
pub fn extract_task_references(text: &str) -> TaskReferences {
    let mut ids = Vec::new();
    for pattern in EXPLICIT_ID_RES.iter() {
        for caps in pattern.captures_iter(text) {
            if let Some(id) = caps.get(1).and_then(|m| m.as_str().parse::<TaskId>().ok()) {
                push_unique(&mut ids, id);
            }
        }
    }

    let mut ordinals = Vec::new();
    for caps in ORDINAL_RE.captures_iter(text) {
        if let Some(position) = caps.get(1).and_then(|m| parse_ordinal(m.as_str())) {
            push_unique(&mut ordinals, position);
        }
    }

    if ids.is_empty() && ordinals.is_empty() {
        for found in BARE_NUMBER_RE.find_iter(text) {
            if let Ok(id) = found.as_str().parse::<TaskId>() {
                push_unique(&mut ids, id);
            }
        }
    }

    let mut titles = Vec::new();
    for pattern in QUOTED_TITLE_RES.iter() {
        for caps in pattern.captures_iter(text) {
            let Some(title) = caps.get(1).map(|m| m.as_str().trim()) else {
                continue;
            };
            if !title.is_empty() {
                push_unique(&mut titles, title.to_string());
            }
        }
    }

    TaskReferences {
        ids,
        ordinals,
        titles,
    }
}

fn parse_ordinal(value: &str) -> Option<usize> {
    let position = match value {
        "一" => 1,
        "二" => 2,
        "三" => 3,
        "四" => 4,
        "五" => 5,
        "六" => 6,
        "七" => 7,
        "八" => 8,
        "九" => 9,
        "十" => 10,
        digits => digits.parse().ok()?,
    };
    (position > 0).then_some(position)
}

fn push_unique<T: PartialEq>(values: &mut Vec<T>, value: T) {
    if !values.contains(&value) {
        values.push(value);
    }
}
