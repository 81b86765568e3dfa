//! Wire dialect capability trait.
//!
//! One implementation exists per upstream wire format. A dialect never
//! performs I/O itself: it describes how to shape an outbound request body
//! and how to normalize inbound chunks, and the engine drives the transport
//! around it. Implementations are selected at runtime through the name-keyed
//! [`DialectRegistry`](crate::DialectRegistry).

use serde_json::Value;

use crate::{Message, ModelInfo, ProviderConfig, ProviderError, ResponseFragment, ToolDefinition};

/// Borrowed view of everything one outbound request is built from:
/// conversation context, provider configuration, and the tool definitions
/// the model may call.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub config: &'a ProviderConfig,
    pub messages: &'a [Message],
    pub tools: &'a [ToolDefinition],
}

pub trait WireDialect: Send + Sync {
    /// Registry key, matched against `ProviderConfig::dialect`.
    fn name(&self) -> &'static str;

    /// Path of the chat-completion endpoint, relative to the base URL.
    fn chat_path(&self) -> &'static str;

    /// Path of the model-listing endpoint, relative to the base URL.
    fn models_path(&self) -> &'static str;

    /// Builds the outbound JSON body for one round.
    fn build_request(&self, context: &RequestContext<'_>) -> Result<Value, ProviderError>;

    /// Normalizes one raw chunk into zero or more fragments.
    ///
    /// In streaming mode `raw` is one decoded line: empty and keep-alive
    /// lines yield nothing, the dialect's terminal sentinel yields a
    /// terminal fragment, and malformed payloads yield a note-carrying
    /// fragment rather than an error so a single bad line cannot abort the
    /// round. In non-streaming mode `raw` is the entire body, mapped once
    /// into the same fragment shape.
    fn parse_chunk(&self, raw: &str, streaming: bool) -> Vec<ResponseFragment>;

    /// Parses the model-listing response body.
    fn parse_models(&self, body: &str) -> Result<Vec<ModelInfo>, ProviderError>;
}
