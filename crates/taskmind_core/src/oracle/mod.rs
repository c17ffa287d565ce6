//! Free-form chat backends.
//!
//! # Responsibility
//! - Define the `ChatOracle` seam used for non-command utterances.
//! - Provide the remote HTTP client, the offline templated responder and the
//!   bounded conversation history.
//!
//! # Invariants
//! - Oracle failures are values; callers fall back to the offline responder
//!   and never surface them as assistant errors.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod history;
pub mod http;
pub mod offline;

pub use history::{ChatMessage, ChatTurn, ConversationHistory, DEFAULT_HISTORY_TURNS};
pub use http::HttpChatOracle;
pub use offline::{OfflineResponder, TaskContext};

/// A backend that answers free text given prior turns.
pub trait ChatOracle {
    fn request(&self, text: &str, history: &ConversationHistory) -> Result<String, OracleError>;
}

/// Chat backend failure.
#[derive(Debug)]
pub enum OracleError {
    /// No usable API key, or offline mode is on.
    NotConfigured,
    Transport(reqwest::Error),
    Status { status: u16, message: String },
    InvalidResponse(String),
}

impl OracleError {
    /// Stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotConfigured => "oracle_not_configured",
            Self::Transport(_) => "oracle_transport",
            Self::Status { .. } => "oracle_status",
            Self::InvalidResponse(_) => "oracle_invalid_response",
        }
    }
}

impl Display for OracleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "chat backend is not configured"),
            Self::Transport(err) => write!(f, "chat request failed: {err}"),
            Self::Status { status, message } => {
                write!(f, "chat backend returned status {status}: {message}")
            }
            Self::InvalidResponse(message) => write!(f, "invalid chat response: {message}"),
        }
    }
}

impl Error for OracleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::NotConfigured | Self::Status { .. } | Self::InvalidResponse(_) => None,
        }
    }
}

impl From<reqwest::Error> for OracleError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}
