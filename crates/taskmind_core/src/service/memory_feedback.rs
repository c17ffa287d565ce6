//! Conversation-memory feedback loop.
//!
//! # Responsibility
//! - Derive preference observations from each interaction and persist them.
//! - Count matched keywords and keep an interaction log.
//! - Surface accumulated preferences as soft hints.
//!
//! # Invariants
//! - Recording is fire-and-forget: store failures are logged at `warn` and
//!   never reach the caller.
//! - Hints are advisory. They only fill unset profile defaults via
//!   `RoleContext::with_preference_hints` and never change keyword results.

use crate::model::preference::{
    PreferenceHints, COMMUNICATION_STYLE_KEY, PREFERRED_PROJECT_KEY,
    PREFERRED_RESPONSIBILITY_KEY, PRIORITY_STYLE_KEY, WORK_PATTERN_KEY,
};
use crate::model::task::{FinalTask, TaskDraft, TaskId};
use crate::parser::intent::Intent;
use crate::parser::keywords::FALLBACK_PROJECT;
use crate::repo::memory_repo::{InteractionRecord, MemoryStore};
use crate::repo::RepoResult;
use crate::service::confirmation::InteractionOutcome;
use log::{debug, warn};

const CONCISE_MAX_CHARS: usize = 10;
const NORMAL_MAX_CHARS: usize = 30;

const WORK_PATTERN_TABLE: &[(&str, &[&str])] = &[
    ("morning", &["早上", "上午"]),
    ("afternoon", &["中午", "下午"]),
    ("evening", &["晚上", "夜里", "今晚"]),
];

/// Preference observations implied by the wording of one input.
pub fn text_signals(raw_text: &str) -> Vec<(&'static str, &'static str)> {
    let mut signals = Vec::new();

    if let Some((pattern, _)) = WORK_PATTERN_TABLE
        .iter()
        .find(|(_, words)| words.iter().any(|word| raw_text.contains(word)))
    {
        signals.push((WORK_PATTERN_KEY, *pattern));
    }

    if raw_text.contains("重要") {
        signals.push((PRIORITY_STYLE_KEY, "importance_focused"));
    } else if raw_text.contains("紧急") || raw_text.contains('急') {
        signals.push((PRIORITY_STYLE_KEY, "urgency_focused"));
    }

    let length = raw_text.trim().chars().count();
    let style = if length < CONCISE_MAX_CHARS {
        "concise"
    } else if length <= NORMAL_MAX_CHARS {
        "normal"
    } else {
        "detailed"
    };
    signals.push((COMMUNICATION_STYLE_KEY, style));

    signals
}

/// A draft that ended up persisted.
#[derive(Debug, Clone, Copy)]
pub struct CommittedTask<'a> {
    pub id: TaskId,
    pub task: &'a FinalTask,
}

/// Memory feedback adapter over a `MemoryStore`.
pub struct MemoryFeedback<M: MemoryStore> {
    store: M,
}

impl<M: MemoryStore> MemoryFeedback<M> {
    pub fn new(store: M) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &M {
        &self.store
    }

    /// Records the outcome of one draft interaction.
    ///
    /// Keyword counters and the preferred project/responsibility are only
    /// updated when the draft was committed.
    pub fn record_interaction(
        &self,
        raw_text: &str,
        draft: &TaskDraft,
        outcome: &InteractionOutcome,
        committed: Option<CommittedTask<'_>>,
    ) {
        let mut failures = 0usize;
        let mut track = |result: RepoResult<()>, step: &str| {
            if let Err(err) = result {
                failures += 1;
                warn!(
                    "event=memory_record module=memory status=error step={} outcome={} error={}",
                    step,
                    outcome.as_str(),
                    err
                );
            }
        };

        for (key, value) in text_signals(raw_text) {
            track(
                self.store.observe_preference(key, value).map(|_| ()),
                "text_signal",
            );
        }

        if let Some(committed) = committed {
            if committed.task.project != FALLBACK_PROJECT {
                track(
                    self.store
                        .observe_preference(PREFERRED_PROJECT_KEY, &committed.task.project)
                        .map(|_| ()),
                    "preferred_project",
                );
            }
            track(
                self.store
                    .observe_preference(
                        PREFERRED_RESPONSIBILITY_KEY,
                        committed.task.responsibility.as_str(),
                    )
                    .map(|_| ()),
                "preferred_responsibility",
            );

            let signals = &draft.signals;
            let categories: [(&str, &[String]); 4] = [
                ("gtd", &signals.gtd_keywords),
                ("importance", &signals.importance_keywords),
                ("urgency", &signals.urgency_keywords),
                ("project", &signals.project_keywords),
            ];
            for (category, keywords) in categories {
                for keyword in keywords {
                    track(
                        self.store
                            .record_keyword(keyword, category, &committed.task.title),
                        "keyword",
                    );
                }
            }
        }

        let record = InteractionRecord::new(
            raw_text,
            Intent::Add.as_str(),
            outcome.as_str(),
            committed.map(|committed| committed.id),
        );
        track(self.store.record_interaction(&record), "interaction");

        debug!(
            "event=memory_record module=memory status={} outcome={} failures={}",
            if failures == 0 { "ok" } else { "partial" },
            outcome.as_str(),
            failures
        );
    }

    /// Records a non-draft exchange (chat, delete, complete, update).
    pub fn record_exchange(
        &self,
        raw_text: &str,
        intent: Intent,
        outcome: &str,
        task_id: Option<TaskId>,
    ) {
        for (key, value) in text_signals(raw_text) {
            if let Err(err) = self.store.observe_preference(key, value) {
                warn!(
                    "event=memory_record module=memory status=error step=text_signal intent={} error={}",
                    intent.as_str(),
                    err
                );
            }
        }

        let record = InteractionRecord::new(raw_text, intent.as_str(), outcome, task_id);
        if let Err(err) = self.store.record_interaction(&record) {
            warn!(
                "event=memory_record module=memory status=error step=interaction intent={} error={}",
                intent.as_str(),
                err
            );
        }
    }

    /// Current learned preferences; empty when the store cannot be read.
    pub fn preference_hints(&self) -> PreferenceHints {
        match self.store.load_preferences() {
            Ok(signals) => PreferenceHints::from_signals(signals),
            Err(err) => {
                warn!(
                    "event=memory_hints module=memory status=error error={}",
                    err
                );
                PreferenceHints::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::text_signals;

    #[test]
    fn morning_wins_when_several_periods_appear() {
        let signals = text_signals("上午写代码，晚上复盘");
        assert!(signals.contains(&("work_pattern", "morning")));
    }

    #[test]
    fn importance_wording_beats_urgency_wording() {
        let signals = text_signals("紧急而且重要");
        assert!(signals.contains(&("priority_style", "importance_focused")));
    }

    #[test]
    fn communication_style_thresholds() {
        assert!(text_signals("买牛奶").contains(&("communication_style", "concise")));
        assert!(text_signals("明天上午九点和团队一起开周会讨论进度")
            .contains(&("communication_style", "normal")));
        let long = "下周之前需要把整个季度的销售数据整理出来，然后和财务部门核对一下差异，最后形成一份完整的分析报告";
        assert!(text_signals(long).contains(&("communication_style", "detailed")));
    }
}
