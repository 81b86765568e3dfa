//! Chat session, exchange request, and progress update types.

use std::sync::Arc;

use bcommon::SessionId;
use bprovider::{Message, ProviderConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    pub id: SessionId,
    pub system_prompt: Option<String>,
}

impl ChatSession {
    pub fn new(id: impl Into<SessionId>) -> Self {
        Self {
            id: id.into(),
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// One exchange: the complete sequence of rounds needed to answer the last
/// user message in the conversation, including all tool sub-rounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRequest {
    pub session: ChatSession,
    pub config: ProviderConfig,
    /// Tool servers whose definitions the model may call this exchange.
    pub tool_servers: Vec<String>,
}

impl ExchangeRequest {
    pub fn new(session: ChatSession, config: ProviderConfig) -> Self {
        Self {
            session,
            config,
            tool_servers: Vec::new(),
        }
    }

    pub fn with_tool_servers(mut self, tool_servers: Vec<String>) -> Self {
        self.tool_servers = tool_servers;
        self
    }
}

/// Progress callback payload: the turn as built so far plus an HTTP-style
/// status. Non-terminal updates always carry status 200; the single
/// terminal update carries the exchange outcome (200, 499, upstream status,
/// 508, or 500).
#[derive(Debug, Clone, PartialEq)]
pub struct TurnUpdate {
    pub message: Message,
    pub status: u16,
    pub detail: Option<String>,
    /// Set on exactly one update per exchange, the terminal one.
    pub finished: bool,
}

/// Caller-supplied progress callback, invoked synchronously and in order:
/// at least once per fragment and exactly once as the terminal call.
pub type TurnObserver = Arc<dyn Fn(TurnUpdate) + Send + Sync>;
