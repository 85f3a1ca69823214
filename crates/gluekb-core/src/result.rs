//! Invocation result returned to the trigger

use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStatus {
    Success,
    Error,
}

/// `{"status": "success" | "error", "message": ...}`
///
/// No error codes are distinguished; the message is free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub status: InvocationStatus,
    pub message: String,
}

impl InvocationResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: InvocationStatus::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: InvocationStatus::Error,
            message: message.into(),
        }
    }

    /// Collapse a run outcome into a result, using `Display` for both arms
    pub fn from_outcome<T: Display, E: Display>(outcome: Result<T, E>) -> Self {
        match outcome {
            Ok(summary) => Self::success(summary.to_string()),
            Err(err) => Self::error(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == InvocationStatus::Success
    }

    /// Pretty JSON form
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
