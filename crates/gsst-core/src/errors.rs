//! Structured error types shared across GSST crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`GsstError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (indices, sizes, values).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the tempering engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum GsstError {
    /// Malformed ladder or schedule settings. Raised at construction and never recovered.
    #[error("configuration error: {0}")]
    Config(ErrorInfo),
    /// The external simulation engine broke its contract.
    #[error("engine contract violation: {0}")]
    Engine(ErrorInfo),
    /// A state index or table shape that does not match the ladder.
    #[error("state error: {0}")]
    State(ErrorInfo),
    /// Serialization, schema and file I/O errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl GsstError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            GsstError::Config(info)
            | GsstError::Engine(info)
            | GsstError::State(info)
            | GsstError::Serde(info) => info,
        }
    }

    /// Shorthand for a configuration error.
    pub fn config(code: impl Into<String>, message: impl Into<String>) -> Self {
        GsstError::Config(ErrorInfo::new(code, message))
    }

    /// Shorthand for an engine contract violation.
    pub fn engine(code: impl Into<String>, message: impl Into<String>) -> Self {
        GsstError::Engine(ErrorInfo::new(code, message))
    }

    /// Returns true when the error is a fatal configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, GsstError::Config(_))
    }
}
