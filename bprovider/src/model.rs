//! Provider-agnostic message, tool, and configuration model types.
//!
//! ```rust
//! use bprovider::{Message, ProviderConfig, ProviderErrorKind, Role};
//!
//! let ok = ProviderConfig::new("openai", "https://api.openai.com/v1", "gpt-4o-mini").validate();
//! assert!(ok.is_ok());
//!
//! let err = ProviderConfig::new("openai", "", "gpt-4o-mini")
//!     .validate()
//!     .expect_err("empty base url should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//!
//! let message = Message::user("Summarize this diff");
//! assert_eq!(message.role, Role::User);
//! ```

use bcommon::GenerationOptions;

use crate::{ProviderError, SecretString};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// One conversational turn.
///
/// The conversation list owning these values is append-only for the duration
/// of one exchange: tool-call request and tool-result messages are appended
/// as a matched pair, history is never rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub reasoning: Option<String>,
    pub tool_call_id: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<TokenUsage>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            reasoning: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
            usage: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant message carrying exactly one resolved tool call, the first
    /// half of the matched pair appended per executed call.
    pub fn assistant_tool_call(call: ToolCall) -> Self {
        let mut message = Self::new(Role::Assistant, "");
        message.tool_calls = vec![call];
        message
    }

    /// Tool message carrying one execution output, re-paired with its
    /// originating call through `tool_call_id`.
    pub fn tool_result(result: ToolResult) -> Self {
        let mut message = Self::new(Role::Tool, result.output);
        message.tool_call_id = Some(result.tool_call_id);
        message
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub output: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Cancelled,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// One entry from a provider's model listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: String,
    pub owned_by: Option<String>,
}

/// Everything the engine needs to reach one remote endpoint: which wire
/// dialect to speak, where, as which model, and with which bearer key.
///
/// The engine receives this value per exchange and never persists it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub dialect: String,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
    pub options: GenerationOptions,
}

impl ProviderConfig {
    pub fn new(
        dialect: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            dialect: dialect.into(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key));
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn enable_streaming(mut self) -> Self {
        self.options.stream = true;
        self
    }

    /// Joins a dialect-relative path onto the configured base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.dialect.trim().is_empty() {
            return Err(ProviderError::invalid_request("dialect must not be empty"));
        }

        if self.base_url.trim().is_empty() {
            return Err(ProviderError::invalid_request("base_url must not be empty"));
        }

        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if let Some(max_tokens) = self.options.max_tokens
            && max_tokens == 0
        {
            return Err(ProviderError::invalid_request(
                "max_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.options.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ProviderError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        Ok(())
    }
}
