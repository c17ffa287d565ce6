//! Domain model for task drafts, persisted tasks and learned preferences.
//!
//! # Responsibility
//! - Define canonical typed records used across parser, services and storage.
//! - Replace loosely keyed rows with explicit structs and enums.
//!
//! # Invariants
//! - Quadrant priority is a pure function of `(importance, urgency)`.
//! - Enum wire literals are stable and shared with storage.

pub mod preference;
pub mod task;
