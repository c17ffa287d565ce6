//! Learned preference signals.
//!
//! # Responsibility
//! - Represent key/value tendencies with a confidence score.
//! - Define the accumulation rule applied on every observation.
//!
//! # Invariants
//! - `confidence` is always within `[0.0, 1.0]`.
//! - Hints are advisory; they never override keyword hits in the parser.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Confidence change applied per observation.
pub const CONFIDENCE_STEP: f64 = 0.1;

pub const WORK_PATTERN_KEY: &str = "work_pattern";
pub const PRIORITY_STYLE_KEY: &str = "priority_style";
pub const COMMUNICATION_STYLE_KEY: &str = "communication_style";
pub const PREFERRED_PROJECT_KEY: &str = "preferred_project";
pub const PREFERRED_RESPONSIBILITY_KEY: &str = "preferred_responsibility";

/// One learned tendency, e.g. `work_pattern = morning (0.6)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSignal {
    pub key: String,
    pub value: String,
    pub confidence: f64,
    /// Total number of observations folded into this signal.
    pub observations: u32,
}

impl PreferenceSignal {
    /// First observation of a key.
    pub fn first(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            confidence: CONFIDENCE_STEP,
            observations: 1,
        }
    }

    /// Folds one observation into the signal.
    ///
    /// Same value reinforces; a different value erodes confidence and takes
    /// over once the old value has no confidence left.
    pub fn observe(&self, observed: &str) -> Self {
        let observations = self.observations.saturating_add(1);
        if self.value == observed {
            return Self {
                key: self.key.clone(),
                value: self.value.clone(),
                confidence: clamp_confidence(self.confidence + CONFIDENCE_STEP),
                observations,
            };
        }

        let eroded = self.confidence - CONFIDENCE_STEP;
        // Float steps of 0.1 accumulate error; treat near-zero as exhausted.
        if eroded <= 1e-9 {
            Self {
                key: self.key.clone(),
                value: observed.to_string(),
                confidence: CONFIDENCE_STEP,
                observations,
            }
        } else {
            Self {
                key: self.key.clone(),
                value: self.value.clone(),
                confidence: clamp_confidence(eroded),
                observations,
            }
        }
    }
}

/// Snapshot of all learned preferences keyed by preference name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceHints {
    signals: BTreeMap<String, PreferenceSignal>,
}

impl PreferenceHints {
    pub fn from_signals(signals: impl IntoIterator<Item = PreferenceSignal>) -> Self {
        Self {
            signals: signals
                .into_iter()
                .map(|signal| (signal.key.clone(), signal))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PreferenceSignal> {
        self.signals.get(key)
    }

    /// Returns the value for `key` only when its confidence reaches `min_confidence`.
    pub fn confident_value(&self, key: &str, min_confidence: f64) -> Option<&str> {
        self.signals
            .get(key)
            .filter(|signal| signal.confidence + 1e-9 >= min_confidence)
            .map(|signal| signal.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PreferenceSignal> {
        self.signals.values()
    }
}

/// Frequency counter for one matched keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMemory {
    pub keyword: String,
    pub category: String,
    pub frequency: u32,
    pub last_context: Option<String>,
}

fn clamp_confidence(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
