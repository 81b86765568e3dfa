//! Canonical incremental response units produced by wire dialects.
//!
//! A `ResponseFragment` is the normalized form of one wire-level chunk,
//! whatever dialect produced it. Fragments are ephemeral: each is consumed
//! exactly once by the turn accumulator, in arrival order.

use crate::{FinishReason, TokenUsage};

/// One piece of a tool call's arguments string.
///
/// `index` is the only stable merge key: every shard with the same index
/// belongs to the same call, and their `arguments_delta` strings concatenate
/// in arrival order. `id` and `name` may appear only on the first shard for
/// an index and are remembered once seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallShard {
    pub index: u32,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments_delta: String,
}

impl ToolCallShard {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            id: None,
            name: None,
            arguments_delta: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_arguments(mut self, arguments_delta: impl Into<String>) -> Self {
        self.arguments_delta = arguments_delta.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseFragment {
    pub content: String,
    pub reasoning: Option<String>,
    pub tool_call_delta: Option<ToolCallShard>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<FinishReason>,
    /// Set when the wire signalled the end of the body (sentinel line,
    /// non-streamed body fully parsed, NDJSON `done` object).
    pub terminal: bool,
    /// Parse-failure description for a chunk that could not be decoded; the
    /// fragment itself still flows through the accumulator so one bad line
    /// does not destroy an otherwise-good stream.
    pub note: Option<String>,
}

impl ResponseFragment {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn reasoning(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: Some(reasoning.into()),
            ..Self::default()
        }
    }

    pub fn shard(shard: ToolCallShard) -> Self {
        Self {
            tool_call_delta: Some(shard),
            ..Self::default()
        }
    }

    pub fn usage(usage: TokenUsage) -> Self {
        Self {
            usage: Some(usage),
            ..Self::default()
        }
    }

    pub fn finished(reason: FinishReason) -> Self {
        Self {
            finish_reason: Some(reason),
            ..Self::default()
        }
    }

    pub fn terminal() -> Self {
        Self {
            terminal: true,
            ..Self::default()
        }
    }

    pub fn note(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::default()
        }
    }

    pub fn into_terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
            && self.reasoning.is_none()
            && self.tool_call_delta.is_none()
            && self.usage.is_none()
            && self.finish_reason.is_none()
            && !self.terminal
            && self.note.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_populate_single_aspects() {
        assert_eq!(ResponseFragment::text("hi").content, "hi");
        assert!(ResponseFragment::terminal().terminal);
        assert!(ResponseFragment::default().is_empty());
        assert!(!ResponseFragment::note("bad line").is_empty());
    }

    #[test]
    fn shard_builder_chains() {
        let shard = ToolCallShard::new(0)
            .with_id("call_1")
            .with_name("add")
            .with_arguments("{\"a\":");

        assert_eq!(shard.index, 0);
        assert_eq!(shard.id.as_deref(), Some("call_1"));
        assert_eq!(shard.name.as_deref(), Some("add"));
        assert_eq!(shard.arguments_delta, "{\"a\":");
    }
}
