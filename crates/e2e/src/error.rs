//! Error types for the sign-up scenario

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Browser driver not found at {0}")]
    DriverNotFound(String),

    #[error("Browser driver failed to start: {0}")]
    DriverStartup(String),

    #[error("Browser driver status check failed after {0} attempts")]
    DriverHealthCheck(usize),

    #[error("Site profile parse error: {0}")]
    ProfileParse(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timeout waiting for {what} after {timeout_ms} ms")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("WebDriver error ({code}): {message}")]
    WebDriver { code: String, message: String },

    #[error("Mailbox API returned {status}: {message}")]
    MailboxApi { status: u16, message: String },

    #[error("Scenario context: {0}")]
    Context(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid regex: {0}")]
    Regex(#[from] regex::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Coarse classification used in scenario reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing or invalid configuration, detected before any step
    Configuration,
    /// An expected-state check did not hold
    Assertion,
    /// A bounded wait elapsed
    Timeout,
    /// The browser driver or mailbox service failed
    Service,
    /// Scenario context misuse
    Internal,
}

impl E2eError {
    pub fn kind(&self) -> FailureKind {
        match self {
            E2eError::Config(_)
            | E2eError::DriverNotFound(_)
            | E2eError::ProfileParse(_)
            | E2eError::Yaml(_)
            | E2eError::Regex(_) => FailureKind::Configuration,
            E2eError::AssertionFailed(_) | E2eError::ElementNotFound(_) => FailureKind::Assertion,
            E2eError::Timeout { .. } => FailureKind::Timeout,
            E2eError::Context(_) => FailureKind::Internal,
            E2eError::DriverStartup(_)
            | E2eError::DriverHealthCheck(_)
            | E2eError::WebDriver { .. }
            | E2eError::MailboxApi { .. }
            | E2eError::Io(_)
            | E2eError::Json(_)
            | E2eError::Http(_) => FailureKind::Service,
        }
    }

    /// Shorthand for a failed expectation
    pub fn assertion(message: impl Into<String>) -> Self {
        E2eError::AssertionFailed(message.into())
    }
}
