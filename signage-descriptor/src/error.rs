//! Error types for the playback descriptor builder.

use thiserror::Error;

/// Errors that abort a single descriptor build.
///
/// Configuration faults (malformed schedule periods) and upstream data
/// faults (missing markers or placeholders) are recovered inside the
/// builder and never show up here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// No player configuration snapshot was supplied.
    #[error("Missing player configuration")]
    MissingConfiguration,

    /// No descriptor template was supplied.
    #[error("Missing descriptor template")]
    MissingTemplate,

    /// The recurrence anchor date could not be derived from "now".
    #[error("Failed to compute schedule anchor date from {0}")]
    AnchorDate(String),

    /// The supplied "now" representation could not be parsed.
    #[error("Invalid current date: {0}")]
    InvalidNow(String),

    /// The assembler was driven out of order.
    #[error("Invalid build state: {0}")]
    InvalidState(String),
}

impl DescriptorError {
    /// Returns true if this error is an environment fault.
    ///
    /// Callers typically answer environment faults by serving a previously
    /// built descriptor instead of failing the poll.
    pub fn is_environment_fault(&self) -> bool {
        matches!(self, DescriptorError::AnchorDate(_) | DescriptorError::InvalidNow(_))
    }
}
