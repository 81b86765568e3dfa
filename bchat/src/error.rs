//! Chat-layer errors, classification, and terminal status mapping.
//!
//! Every failure an exchange can hit collapses into one of these kinds and
//! is reported as a terminal turn through the same callback channel as
//! success; nothing is thrown past the engine boundary.

use std::error::Error;
use std::fmt::{Display, Formatter};

use bprovider::{ProviderError, ProviderErrorKind};
use btooling::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    /// The cancellation token fired mid-round.
    Aborted,
    /// The upstream endpoint answered with a non-2xx status.
    Http,
    Tooling,
    /// The tool loop hit its configured round bound.
    TooManyRounds,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    /// Upstream status for `Http` errors.
    pub upstream_status: Option<u16>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            upstream_status: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Aborted, message)
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ChatErrorKind::Http,
            message: message.into(),
            upstream_status: Some(status),
        }
    }

    pub fn tooling(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Tooling, message)
    }

    pub fn too_many_rounds(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::TooManyRounds, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Other, message)
    }

    /// Status carried by the terminal turn for this failure.
    pub fn status(&self) -> u16 {
        match self.kind {
            ChatErrorKind::InvalidRequest => 400,
            ChatErrorKind::Aborted => 499,
            ChatErrorKind::Http => self.upstream_status.unwrap_or(502),
            ChatErrorKind::Tooling => 500,
            ChatErrorKind::TooManyRounds => 508,
            ChatErrorKind::Other => 500,
        }
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        if let Some(status) = value.status {
            return ChatError::http(status, value.message);
        }

        match value.kind {
            ProviderErrorKind::InvalidRequest => ChatError::invalid_request(value.message),
            _ => ChatError::other(value.message),
        }
    }
}

impl From<ToolError> for ChatError {
    fn from(value: ToolError) -> Self {
        ChatError::tooling(value.to_string())
    }
}
