//! Provider wire layer: model types, chunk normalization, and transport.

mod chunk;
mod credentials;
mod dialect;
mod error;
mod lines;
mod model;
mod registry;
mod resilience;
mod transport;

pub mod dialects;

pub mod prelude {
    pub use crate::{
        ChatTransport, CredentialStore, DialectRegistry, FinishReason, HttpChatTransport,
        LineDecoder, Message, ModelInfo, ProviderConfig, ProviderError, ProviderErrorKind,
        RequestContext, ResponseFragment, RetryPolicy, Role, SecretString, TokenUsage,
        ToolCall, ToolCallShard, ToolDefinition, ToolResult, TransportBody, WireDialect,
    };
}

pub use bcommon::BoxFuture;

/// Future alias used by transport and dialect contracts.
pub type ProviderFuture<'a, T> = BoxFuture<'a, T>;

pub use chunk::{ResponseFragment, ToolCallShard};
pub use credentials::{CredentialStore, SecretString};
pub use dialect::{RequestContext, WireDialect};
pub use error::{ProviderError, ProviderErrorKind};
pub use lines::LineDecoder;
pub use model::{
    FinishReason, Message, ModelInfo, ProviderConfig, Role, TokenUsage, ToolCall, ToolDefinition,
    ToolResult,
};
pub use registry::DialectRegistry;
pub use resilience::{
    NoopOperationHooks, ProviderOperationHooks, RetryPolicy, execute_with_retry,
};
pub use transport::{ByteChunkStream, ChatTransport, HttpChatTransport, TransportBody};

#[cfg(feature = "dialect-openai")]
pub use dialects::openai::OpenAiDialect;

#[cfg(feature = "dialect-ollama")]
pub use dialects::ollama::OllamaDialect;
