//! Error taxonomy for form submissions and completion calls.

use std::time::Duration;
use thiserror::Error;

/// Input rejected before any work is done. History is never touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter your goals/tasks to create a schedule.")]
    EmptyTasks,

    #[error("Please enter a project name to allocate time.")]
    EmptyProjectName,

    #[error("Work duration must be between {min} and {max} hours (got {got})")]
    DurationOutOfRange { got: u32, min: u32, max: u32 },

    #[error("Total project hours must be between {min} and {max} (got {got})")]
    HoursOutOfRange { got: u32, min: u32, max: u32 },

    #[error("Unknown {field} '{value}' (expected one of: {expected})")]
    UnknownChoice {
        field: &'static str,
        value: String,
        expected: String,
    },

    #[error("Invalid deadline '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

/// The remote completion call did not produce a usable response.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Refusing to send an empty prompt")]
    EmptyPrompt,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Whether a bounded retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CompletionError::Network(_) | CompletionError::Timeout(_) => true,
            CompletionError::Api { status, .. } => matches!(*status, 408 | 429 | 500..=599),
            CompletionError::EmptyPrompt
            | CompletionError::Auth(_)
            | CompletionError::InvalidResponse(_) => false,
        }
    }
}

/// Failure of a schedule submission; either kind leaves history unchanged.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not generate a schedule: {0}")]
    Completion(#[from] CompletionError),
}
