//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate parser, repositories and oracle into use-case level APIs.
//! - Keep CLI/UI layers decoupled from storage details.

pub mod assistant_service;
pub mod confirmation;
pub mod memory_feedback;

pub use assistant_service::{Assistant, AssistantError, AssistantReply};
pub use confirmation::{
    confirm, ConfirmError, ConfirmationSession, Decision, DraftOverrides, InteractionOutcome,
    Resolution,
};
pub use memory_feedback::MemoryFeedback;
