//! OpenAI-compatible chat-completions dialect (SSE framing, delta chunks).
//!
//! This is the canonical dialect: most hosted endpoints speak a close
//! variant of it. Streaming bodies arrive as `data:` framed lines carrying
//! delta objects; tool-call arguments arrive sharded, keyed by the delta's
//! `index` field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    FinishReason, Message, ModelInfo, ProviderError, RequestContext, ResponseFragment, Role,
    TokenUsage, ToolCallShard, ToolDefinition, WireDialect,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiDialect;

impl WireDialect for OpenAiDialect {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn chat_path(&self) -> &'static str {
        "chat/completions"
    }

    fn models_path(&self) -> &'static str {
        "models"
    }

    fn build_request(&self, context: &RequestContext<'_>) -> Result<Value, ProviderError> {
        let api_request = build_api_request(context)?;
        serde_json::to_value(&api_request)
            .map_err(|err| ProviderError::other(format!("request serialization failed: {err}")))
    }

    fn parse_chunk(&self, raw: &str, streaming: bool) -> Vec<ResponseFragment> {
        if streaming {
            parse_stream_line(raw)
        } else {
            parse_full_body(raw)
        }
    }

    fn parse_models(&self, body: &str) -> Result<Vec<ModelInfo>, ProviderError> {
        let parsed = serde_json::from_str::<OpenAiApiModelList>(body)
            .map_err(|err| ProviderError::transport(format!("model listing unparseable: {err}")))?;

        Ok(parsed
            .data
            .into_iter()
            .map(|entry| ModelInfo {
                id: entry.id,
                owned_by: entry.owned_by,
            })
            .collect())
    }
}

fn parse_stream_line(raw: &str) -> Vec<ResponseFragment> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with(':') {
        return Vec::new();
    }

    // Non-data SSE fields (event:, id:, retry:) carry nothing for us.
    let Some(payload) = line.strip_prefix("data:") else {
        return Vec::new();
    };

    let payload = payload.trim();
    if payload == "[DONE]" {
        return vec![ResponseFragment::terminal()];
    }

    match serde_json::from_str::<OpenAiApiStreamResponse>(payload) {
        Ok(parsed) => {
            let mut fragments = Vec::new();

            if let Some(choice) = parsed.choices.first() {
                if let Some(content) = &choice.delta.content
                    && !content.is_empty()
                {
                    fragments.push(ResponseFragment::text(content.clone()));
                }

                if let Some(reasoning) = &choice.delta.reasoning_content
                    && !reasoning.is_empty()
                {
                    fragments.push(ResponseFragment::reasoning(reasoning.clone()));
                }

                if let Some(delta_calls) = &choice.delta.tool_calls {
                    for (position, delta_call) in delta_calls.iter().enumerate() {
                        fragments.push(ResponseFragment::shard(delta_shard(delta_call, position)));
                    }
                }

                if let Some(reason) = choice.finish_reason.as_deref() {
                    fragments.push(ResponseFragment::finished(parse_finish_reason(Some(reason))));
                }
            }

            if let Some(usage) = parsed.usage {
                fragments.push(ResponseFragment::usage(usage.into()));
            }

            fragments
        }
        Err(err) => vec![ResponseFragment::note(format!(
            "unparseable stream chunk: {err}"
        ))],
    }
}

fn parse_full_body(body: &str) -> Vec<ResponseFragment> {
    let parsed = match serde_json::from_str::<OpenAiApiResponse>(body) {
        Ok(parsed) => parsed,
        Err(err) => {
            return vec![ResponseFragment::note(format!("unparseable body: {err}")).into_terminal()];
        }
    };

    let Some(choice) = parsed.choices.into_iter().next() else {
        return vec![
            ResponseFragment::note("response did not include choices").into_terminal(),
        ];
    };

    let mut fragments = Vec::new();

    if let Some(content) = choice.message.content
        && !content.is_empty()
    {
        fragments.push(ResponseFragment::text(content));
    }

    if let Some(reasoning) = choice.message.reasoning_content
        && !reasoning.is_empty()
    {
        fragments.push(ResponseFragment::reasoning(reasoning));
    }

    for (position, call) in choice.message.tool_calls.unwrap_or_default().into_iter().enumerate() {
        let shard = ToolCallShard::new(position as u32)
            .with_id(call.id)
            .with_name(call.function.name)
            .with_arguments(call.function.arguments);
        fragments.push(ResponseFragment::shard(shard));
    }

    if let Some(reason) = choice.finish_reason.as_deref() {
        fragments.push(ResponseFragment::finished(parse_finish_reason(Some(reason))));
    }

    if let Some(usage) = parsed.usage {
        fragments.push(ResponseFragment::usage(usage.into()));
    }

    fragments.push(ResponseFragment::terminal());
    fragments
}

fn delta_shard(delta_call: &OpenAiApiDeltaToolCall, position: usize) -> ToolCallShard {
    let mut shard = ToolCallShard::new(delta_call.index.unwrap_or(position as u32));
    shard.id = delta_call.id.clone();

    if let Some(function) = &delta_call.function {
        shard.name = function.name.clone();
        if let Some(arguments) = &function.arguments {
            shard.arguments_delta = arguments.clone();
        }
    }

    shard
}

pub(crate) fn parse_finish_reason(value: Option<&str>) -> FinishReason {
    match value {
        Some("stop") => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("tool_calls") => FinishReason::ToolCalls,
        Some("content_filter") => FinishReason::ContentFilter,
        Some("cancelled") => FinishReason::Cancelled,
        _ => FinishReason::Other,
    }
}

fn build_api_request(context: &RequestContext<'_>) -> Result<OpenAiApiRequest, ProviderError> {
    let messages = context
        .messages
        .iter()
        .map(OpenAiApiMessage::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    if messages.is_empty() {
        return Err(ProviderError::invalid_request(
            "request requires at least one message",
        ));
    }

    let tools = if context.tools.is_empty() {
        None
    } else {
        Some(
            context
                .tools
                .iter()
                .map(OpenAiApiTool::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    Ok(OpenAiApiRequest {
        model: context.config.model.clone(),
        messages,
        tools,
        temperature: context.config.options.temperature,
        max_tokens: context.config.options.max_tokens,
        stream: context.config.options.stream,
    })
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiRequest {
    pub model: String,
    pub messages: Vec<OpenAiApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OpenAiApiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAiApiToolCall>>,
}

impl TryFrom<&Message> for OpenAiApiMessage {
    type Error = ProviderError;

    fn try_from(value: &Message) -> Result<Self, Self::Error> {
        if value.content.trim().is_empty()
            && value.role != Role::Assistant
            && value.role != Role::Tool
        {
            return Err(ProviderError::invalid_request(
                "message content must not be empty",
            ));
        }

        if value.role == Role::Tool && value.tool_call_id.is_none() {
            return Err(ProviderError::invalid_request(
                "tool message requires a tool_call_id",
            ));
        }

        let tool_calls = if value.tool_calls.is_empty() {
            None
        } else {
            Some(
                value
                    .tool_calls
                    .iter()
                    .map(|call| OpenAiApiToolCall {
                        id: call.id.clone(),
                        kind: "function".to_string(),
                        function: OpenAiApiToolFunction {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect(),
            )
        };

        Ok(Self {
            role: value.role.as_str().to_string(),
            content: value.content.clone(),
            tool_call_id: value.tool_call_id.clone(),
            tool_calls,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct OpenAiApiToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: OpenAiApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct OpenAiApiToolFunction {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiTool {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: OpenAiApiFunction,
}

impl TryFrom<&ToolDefinition> for OpenAiApiTool {
    type Error = ProviderError;

    fn try_from(value: &ToolDefinition) -> Result<Self, Self::Error> {
        let parameters = serde_json::from_str::<Value>(&value.input_schema)
            .map_err(|_| ProviderError::invalid_request("tool schema must be valid JSON"))?;

        Ok(Self {
            kind: "function".to_string(),
            function: OpenAiApiFunction {
                name: value.name.clone(),
                description: value.description.clone(),
                parameters,
            },
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiResponse {
    pub choices: Vec<OpenAiApiChoice>,
    #[serde(default)]
    pub usage: Option<OpenAiApiUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiChoice {
    pub message: OpenAiApiAssistantMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiAssistantMessage {
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
    pub tool_calls: Option<Vec<OpenAiApiToolCall>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiStreamResponse {
    pub choices: Vec<OpenAiApiStreamChoice>,
    #[serde(default)]
    pub usage: Option<OpenAiApiUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiStreamChoice {
    pub delta: OpenAiApiStreamDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpenAiApiStreamDelta {
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
    pub tool_calls: Option<Vec<OpenAiApiDeltaToolCall>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiDeltaToolCall {
    pub index: Option<u32>,
    pub id: Option<String>,
    pub function: Option<OpenAiApiDeltaToolFunction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiDeltaToolFunction {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl From<OpenAiApiUsage> for TokenUsage {
    fn from(value: OpenAiApiUsage) -> Self {
        Self {
            input_tokens: value.prompt_tokens,
            output_tokens: value.completion_tokens,
            total_tokens: value.total_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiModelList {
    pub data: Vec<OpenAiApiModelEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiModelEntry {
    pub id: String,
    #[serde(default)]
    pub owned_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use bcommon::GenerationOptions;

    use super::*;
    use crate::{ProviderConfig, ToolCall};

    fn config() -> ProviderConfig {
        ProviderConfig {
            dialect: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            options: GenerationOptions::default().with_temperature(0.2),
        }
    }

    #[test]
    fn keep_alive_and_empty_lines_yield_nothing() {
        let dialect = OpenAiDialect;
        assert!(dialect.parse_chunk("", true).is_empty());
        assert!(dialect.parse_chunk("   ", true).is_empty());
        assert!(dialect.parse_chunk(": keep-alive", true).is_empty());
        assert!(dialect.parse_chunk("event: message", true).is_empty());
    }

    #[test]
    fn done_sentinel_yields_terminal_fragment() {
        let fragments = OpenAiDialect.parse_chunk("data: [DONE]", true);
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].terminal);
        assert!(fragments[0].content.is_empty());
    }

    #[test]
    fn malformed_payload_yields_note_not_error() {
        let fragments = OpenAiDialect.parse_chunk("data: {not json", true);
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].note.is_some());
        assert!(!fragments[0].terminal);
    }

    #[test]
    fn content_delta_becomes_text_fragment() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"},"finish_reason":null}]}"#;
        let fragments = OpenAiDialect.parse_chunk(line, true);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].content, "Hel");
    }

    #[test]
    fn tool_call_delta_becomes_indexed_shard() {
        let first = r#"data: {"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"add","arguments":"{\"a\":"}}]},"finish_reason":null}]}"#;
        let fragments = OpenAiDialect.parse_chunk(first, true);
        assert_eq!(fragments.len(), 1);

        let shard = fragments[0]
            .tool_call_delta
            .as_ref()
            .expect("shard expected");
        assert_eq!(shard.index, 0);
        assert_eq!(shard.id.as_deref(), Some("call_1"));
        assert_eq!(shard.name.as_deref(), Some("add"));
        assert_eq!(shard.arguments_delta, "{\"a\":");

        let second = r#"data: {"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"2}"}}]},"finish_reason":null}]}"#;
        let fragments = OpenAiDialect.parse_chunk(second, true);
        let shard = fragments[0]
            .tool_call_delta
            .as_ref()
            .expect("shard expected");
        assert_eq!(shard.index, 0);
        assert_eq!(shard.id, None);
        assert_eq!(shard.arguments_delta, "2}");
    }

    #[test]
    fn finish_reason_and_usage_ride_separate_fragments() {
        let line = r#"data: {"choices":[{"delta":{},"finish_reason":"tool_calls"}],"usage":{"prompt_tokens":7,"completion_tokens":3,"total_tokens":10}}"#;
        let fragments = OpenAiDialect.parse_chunk(line, true);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(
            fragments[1].usage,
            Some(TokenUsage {
                input_tokens: 7,
                output_tokens: 3,
                total_tokens: 10,
            })
        );
    }

    #[test]
    fn full_body_maps_into_same_fragment_shape() {
        let body = r#"{
            "choices": [{
                "message": {
                    "content": "The answer is 4",
                    "tool_calls": [{"id":"call_1","type":"function","function":{"name":"add","arguments":"{\"a\":2,\"b\":2}"}}]
                },
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 5, "completion_tokens": 4, "total_tokens": 9}
        }"#;

        let fragments = OpenAiDialect.parse_chunk(body, false);
        assert_eq!(fragments[0].content, "The answer is 4");

        let shard = fragments[1].tool_call_delta.as_ref().expect("shard expected");
        assert_eq!(shard.index, 0);
        assert_eq!(shard.name.as_deref(), Some("add"));
        assert_eq!(shard.arguments_delta, "{\"a\":2,\"b\":2}");

        assert_eq!(fragments[2].finish_reason, Some(FinishReason::Stop));
        assert!(fragments[3].usage.is_some());
        assert!(fragments.last().expect("terminal expected").terminal);
    }

    #[test]
    fn unparseable_full_body_yields_terminal_note() {
        let fragments = OpenAiDialect.parse_chunk("<html>bad gateway</html>", false);
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].note.is_some());
        assert!(fragments[0].terminal);
    }

    #[test]
    fn build_request_shapes_messages_and_tools() {
        let config = config();
        let messages = vec![
            Message::user("what's 2+2 via tool add"),
            Message::assistant_tool_call(ToolCall {
                id: "call_1".to_string(),
                name: "add".to_string(),
                arguments: "{\"a\":2,\"b\":2}".to_string(),
            }),
            Message::tool_result(crate::ToolResult {
                tool_call_id: "call_1".to_string(),
                output: "4".to_string(),
            }),
        ];
        let tools = vec![ToolDefinition {
            name: "add".to_string(),
            description: "Adds numbers".to_string(),
            input_schema: "{\"type\":\"object\"}".to_string(),
        }];

        let body = OpenAiDialect
            .build_request(&RequestContext {
                config: &config,
                messages: &messages,
                tools: &tools,
            })
            .expect("request should build");

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][1]["tool_calls"][0]["id"], "call_1");
        assert_eq!(body["messages"][2]["role"], "tool");
        assert_eq!(body["messages"][2]["tool_call_id"], "call_1");
        assert_eq!(body["tools"][0]["function"]["name"], "add");
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn build_request_rejects_invalid_tool_schema() {
        let config = config();
        let messages = vec![Message::user("hi")];
        let tools = vec![ToolDefinition {
            name: "broken".to_string(),
            description: "Bad schema".to_string(),
            input_schema: "{not json".to_string(),
        }];

        let error = OpenAiDialect
            .build_request(&RequestContext {
                config: &config,
                messages: &messages,
                tools: &tools,
            })
            .expect_err("invalid schema should fail");
        assert_eq!(error.kind, crate::ProviderErrorKind::InvalidRequest);
    }

    #[test]
    fn parse_finish_reason_maps_expected_values() {
        assert_eq!(parse_finish_reason(Some("stop")), FinishReason::Stop);
        assert_eq!(parse_finish_reason(Some("length")), FinishReason::Length);
        assert_eq!(
            parse_finish_reason(Some("tool_calls")),
            FinishReason::ToolCalls
        );
        assert_eq!(
            parse_finish_reason(Some("content_filter")),
            FinishReason::ContentFilter
        );
        assert_eq!(parse_finish_reason(Some("unknown")), FinishReason::Other);
        assert_eq!(parse_finish_reason(None), FinishReason::Other);
    }

    #[test]
    fn parse_models_extracts_entries() {
        let body = r#"{"object":"list","data":[{"id":"gpt-4o-mini","owned_by":"openai"},{"id":"gpt-4o"}]}"#;
        let models = OpenAiDialect.parse_models(body).expect("listing should parse");
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id, "gpt-4o-mini");
        assert_eq!(models[0].owned_by.as_deref(), Some("openai"));
        assert_eq!(models[1].owned_by, None);
    }
}
