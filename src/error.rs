//! Error types for the JADX MCP server.
//!
//! Tool execution errors are returned with `is_error: true` in CallToolResult,
//! while protocol errors (invalid tool name, malformed args) are handled by rmcp.

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Coarse failure category reported alongside every error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// The request was rejected: bad arguments, missing cache entry, or an
    /// error status from the backend.
    Client,
    /// The backend could not be reached or did not answer in time.
    Transport,
    Unexpected,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Transport => "transport",
            Self::Unexpected => "unexpected",
        }
    }
}

/// Tool execution errors - returned with is_error: true in CallToolResult
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Backend unreachable: {0}")]
    Transport(String),

    #[error("Backend error{}: {message}", status_suffix(.status))]
    Backend {
        status: Option<u16>,
        message: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl ToolError {
    pub fn category(&self) -> FailureCategory {
        match self {
            ToolError::Transport(_) => FailureCategory::Transport,
            ToolError::Backend { .. } | ToolError::InvalidArgument(_) | ToolError::NotFound(_) => {
                FailureCategory::Client
            }
            ToolError::Unexpected(_) => FailureCategory::Unexpected,
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        ToolError::InvalidArgument(msg.into())
    }

    /// Convert to MCP CallToolResult with is_error: true
    pub fn to_tool_result(&self) -> CallToolResult {
        let body = json!({
            "error": self.to_string(),
            "category": self.category().as_str(),
        });
        CallToolResult::error(vec![Content::text(
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| self.to_string()),
        )])
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            ToolError::Backend {
                status: Some(status.as_u16()),
                message: e.to_string(),
            }
        } else if e.is_timeout() || e.is_connect() || e.is_request() {
            ToolError::Transport(e.to_string())
        } else if e.is_body() || e.is_decode() {
            // The connection dropped while the body was being read.
            ToolError::Transport(e.to_string())
        } else {
            ToolError::Unexpected(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        ToolError::Unexpected(e.to_string())
    }
}
