//! Natural-language task parsing.
//!
//! # Responsibility
//! - Route commands, extract titles and time expressions, classify drafts.
//!
//! # Invariants
//! - Everything under this module is pure: no storage access, no clock reads.
//! - Keyword tables are the only vocabulary; unknown text degrades to defaults.

pub mod classifier;
pub mod intent;
pub mod keywords;
pub mod time_extract;
pub mod title;

pub use classifier::{classify, reparse, CustomProject, ParseError, RoleContext};
pub use intent::{extract_task_references, route_intent, Intent, TaskReferences};
pub use time_extract::{extract_time, TimeExtraction};
pub use title::extract_title;
