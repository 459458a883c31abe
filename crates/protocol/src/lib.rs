use serde::{Deserialize, Serialize};

pub mod limits;

/// JSON field carrying the prompt in an `/ask` body.
pub const FIELD_PROMPT: &str = "prompt";
/// JSON field carrying the optional per-request timeout in milliseconds.
pub const FIELD_TIMEOUT_MS: &str = "timeoutMs";

/// Exit code reported when the child produced no numeric status.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// Body of a `200` reply from `/ask`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<ExitDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timed_out: Option<bool>,
    /// Set when the terminate signal was ignored and the group was killed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_killed: Option<bool>,
}

impl AskResponse {
    pub fn new(code: Option<i32>, stdout: String, stderr: String) -> Self {
        Self {
            code: code.unwrap_or(UNKNOWN_EXIT_CODE),
            stdout,
            stderr,
            exit: None,
            timed_out: None,
            force_killed: None,
        }
    }

    pub fn with_detail(mut self, exit: ExitDetail, timed_out: bool, force_killed: bool) -> Self {
        self.exit = Some(exit);
        self.timed_out = Some(timed_out);
        self.force_killed = Some(force_killed);
        self
    }
}

/// How the child left, for callers that opt into the detailed form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitDetail {
    Exited { code: i32 },
    Signaled { signal: String },
    Unknown,
}

/// Body of every non-`200` reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
