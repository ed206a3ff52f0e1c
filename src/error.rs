// src/error.rs
//! Error taxonomy shared by the parser, the pipeline and the menu cache.
//!
//! Every variant owns plain strings so a single refresh outcome can be cloned
//! and handed to each caller waiting on the same in-flight refresh.

use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MenuError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MenuError {
    /// The document does not match the expected template.
    #[error("format error: {0}")]
    Format(String),

    /// Text extraction, rendering or recognition failed.
    #[error("{tool}: {message}")]
    ExternalTool { tool: String, message: String },

    /// Fetch failure, bad status, or an unexpected number of download links.
    #[error("network error: {0}")]
    Network(String),

    /// Lookup outside the refresh window.
    #[error("date {date} out of range: {reason}")]
    Range { date: NaiveDate, reason: String },

    /// In-window date that the source has not published (yet).
    #[error("no menu published for {0}")]
    NotYetPublished(NaiveDate),

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl MenuError {
    pub fn format(msg: impl Into<String>) -> Self {
        MenuError::Format(msg.into())
    }

    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        MenuError::ExternalTool { tool: tool.into(), message: message.into() }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        MenuError::Network(msg.into())
    }

    pub fn range(date: NaiveDate, reason: impl Into<String>) -> Self {
        MenuError::Range { date, reason: reason.into() }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, MenuError::Range { .. })
    }

    pub fn is_not_yet_published(&self) -> bool {
        matches!(self, MenuError::NotYetPublished(_))
    }

    /// Prefix the message with where it happened, keeping the variant.
    pub fn context(self, what: &str) -> Self {
        match self {
            MenuError::Format(m) => MenuError::Format(format!("{what}: {m}")),
            MenuError::Network(m) => MenuError::Network(format!("{what}: {m}")),
            MenuError::ExternalTool { tool, message } => {
                MenuError::ExternalTool { tool, message: format!("{what}: {message}") }
            }
            MenuError::Internal(m) => MenuError::Internal(format!("{what}: {m}")),
            other => other,
        }
    }
}
