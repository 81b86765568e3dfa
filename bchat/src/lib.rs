//! Streaming, multi-round, tool-calling chat request engine.
//!
//! One [`ChatService::run_exchange`] call answers the last user message in
//! a conversation: it issues a chat-completion round, merges the streamed
//! (or whole) response into one assistant turn, executes any tool calls the
//! model requested, and repeats until a round produces no calls, bounded
//! by [`ChatPolicy::max_tool_rounds`]. Progress and the terminal outcome
//! are reported through one callback channel; cancellation is race-free
//! through the per-session [`CancelController`].

mod accumulator;
mod cancel;
mod error;
mod hooks;
mod round;
mod service;
mod types;

pub mod prelude {
    pub use crate::{
        CancelController, ChatEngineHooks, ChatError, ChatErrorKind, ChatPolicy, ChatService,
        ChatServiceBuilder, ChatSession, ExchangeRequest, NoopChatEngineHooks, TurnAccumulator,
        TurnObserver, TurnUpdate,
    };
    pub use bcommon::{MetadataMap, RequestId, SessionId};
    pub use bprovider::{
        DialectRegistry, Message, ProviderConfig, ResponseFragment, Role, ToolCall,
        ToolCallShard, ToolDefinition, ToolResult,
    };
    pub use btooling::{
        DefaultToolRuntime, Tool, ToolError, ToolErrorKind, ToolExecutionContext,
        ToolExecutionResult, ToolRegistry, ToolRuntime,
    };
}

pub use accumulator::TurnAccumulator;
pub use cancel::CancelController;
pub use error::{ChatError, ChatErrorKind};
pub use hooks::{ChatEngineHooks, NoopChatEngineHooks};
pub(crate) use round::RoundDriver;
pub use service::{ChatPolicy, ChatService, ChatServiceBuilder};
pub use types::{ChatSession, ExchangeRequest, TurnObserver, TurnUpdate};
