//! Ollama native chat dialect (NDJSON framing, whole objects per line).
//!
//! Structurally different from the OpenAI dialect in every way that matters
//! to the parser seam: no `data:` prefix, no sentinel line, tool calls
//! arrive complete (arguments as a JSON object, no call ids, no shard
//! index), and the final object carries `done: true` plus the eval counts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    FinishReason, Message, ModelInfo, ProviderError, RequestContext, ResponseFragment, Role,
    TokenUsage, ToolCallShard, WireDialect,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct OllamaDialect;

impl WireDialect for OllamaDialect {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn chat_path(&self) -> &'static str {
        "api/chat"
    }

    fn models_path(&self) -> &'static str {
        "api/tags"
    }

    fn build_request(&self, context: &RequestContext<'_>) -> Result<Value, ProviderError> {
        let messages = context
            .messages
            .iter()
            .map(OllamaApiMessage::from)
            .collect::<Vec<_>>();

        if messages.is_empty() {
            return Err(ProviderError::invalid_request(
                "request requires at least one message",
            ));
        }

        let tools = if context.tools.is_empty() {
            None
        } else {
            let mut tools = Vec::with_capacity(context.tools.len());
            for tool in context.tools {
                let parameters = serde_json::from_str::<Value>(&tool.input_schema)
                    .map_err(|_| ProviderError::invalid_request("tool schema must be valid JSON"))?;
                tools.push(serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": parameters,
                    }
                }));
            }
            Some(tools)
        };

        let request = OllamaApiRequest {
            model: context.config.model.clone(),
            messages,
            stream: context.config.options.stream,
            tools,
            options: OllamaApiOptions {
                temperature: context.config.options.temperature,
                num_predict: context.config.options.max_tokens,
            },
        };

        serde_json::to_value(&request)
            .map_err(|err| ProviderError::other(format!("request serialization failed: {err}")))
    }

    fn parse_chunk(&self, raw: &str, _streaming: bool) -> Vec<ResponseFragment> {
        // Streamed and non-streamed bodies share one object shape; a
        // non-streamed body is simply the final object on its own.
        let line = raw.trim();
        if line.is_empty() {
            return Vec::new();
        }

        let parsed = match serde_json::from_str::<OllamaApiResponse>(line) {
            Ok(parsed) => parsed,
            Err(err) => {
                return vec![ResponseFragment::note(format!(
                    "unparseable chat object: {err}"
                ))];
            }
        };

        let mut fragments = Vec::new();

        if let Some(message) = &parsed.message {
            if !message.content.is_empty() {
                fragments.push(ResponseFragment::text(message.content.clone()));
            }

            if let Some(thinking) = &message.thinking
                && !thinking.is_empty()
            {
                fragments.push(ResponseFragment::reasoning(thinking.clone()));
            }

            // Calls arrive whole; ids are synthesized because the wire has
            // none, and the position within this object is the shard index.
            for (position, call) in message.tool_calls.iter().flatten().enumerate() {
                let arguments = call.function.arguments.to_string();
                let shard = ToolCallShard::new(position as u32)
                    .with_id(format!("tool_call_{position}"))
                    .with_name(call.function.name.clone())
                    .with_arguments(arguments);
                fragments.push(ResponseFragment::shard(shard));
            }
        }

        if parsed.done {
            fragments.push(ResponseFragment::finished(parse_done_reason(
                parsed.done_reason.as_deref(),
            )));
            fragments.push(ResponseFragment::usage(TokenUsage {
                input_tokens: parsed.prompt_eval_count,
                output_tokens: parsed.eval_count,
                total_tokens: parsed.prompt_eval_count + parsed.eval_count,
            }));
            fragments.push(ResponseFragment::terminal());
        }

        fragments
    }

    fn parse_models(&self, body: &str) -> Result<Vec<ModelInfo>, ProviderError> {
        let parsed = serde_json::from_str::<OllamaApiTagList>(body)
            .map_err(|err| ProviderError::transport(format!("model listing unparseable: {err}")))?;

        Ok(parsed
            .models
            .into_iter()
            .map(|entry| ModelInfo {
                id: entry.name,
                owned_by: None,
            })
            .collect())
    }
}

fn parse_done_reason(value: Option<&str>) -> FinishReason {
    match value {
        Some("stop") => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("tool_calls") => FinishReason::ToolCalls,
        _ => FinishReason::Other,
    }
}

#[derive(Debug, Serialize)]
struct OllamaApiRequest {
    model: String,
    messages: Vec<OllamaApiMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    options: OllamaApiOptions,
}

#[derive(Debug, Serialize)]
struct OllamaApiOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OllamaApiMessage {
    role: String,
    content: String,
}

impl From<&Message> for OllamaApiMessage {
    fn from(value: &Message) -> Self {
        Self {
            role: match value.role {
                Role::Tool => "tool".to_string(),
                role => role.as_str().to_string(),
            },
            content: value.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaApiResponse {
    #[serde(default)]
    message: Option<OllamaApiResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaApiResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    thinking: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OllamaApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OllamaApiToolCall {
    function: OllamaApiToolFunction,
}

#[derive(Debug, Deserialize)]
struct OllamaApiToolFunction {
    name: String,
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct OllamaApiTagList {
    models: Vec<OllamaApiTagEntry>,
}

#[derive(Debug, Deserialize)]
struct OllamaApiTagEntry {
    name: String,
}

#[cfg(test)]
mod tests {
    use bcommon::GenerationOptions;

    use super::*;
    use crate::ProviderConfig;

    #[test]
    fn content_object_becomes_text_fragment() {
        let line = r#"{"model":"llama3","message":{"role":"assistant","content":"Hel"},"done":false}"#;
        let fragments = OllamaDialect.parse_chunk(line, true);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].content, "Hel");
        assert!(!fragments[0].terminal);
    }

    #[test]
    fn done_object_carries_finish_usage_and_terminal() {
        let line = r#"{"model":"llama3","message":{"role":"assistant","content":""},"done":true,"done_reason":"stop","prompt_eval_count":12,"eval_count":5}"#;
        let fragments = OllamaDialect.parse_chunk(line, true);

        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].finish_reason, Some(FinishReason::Stop));
        assert_eq!(
            fragments[1].usage,
            Some(TokenUsage {
                input_tokens: 12,
                output_tokens: 5,
                total_tokens: 17,
            })
        );
        assert!(fragments[2].terminal);
    }

    #[test]
    fn whole_tool_calls_become_complete_shards_with_synthesized_ids() {
        let line = r#"{"model":"llama3","message":{"role":"assistant","content":"","tool_calls":[{"function":{"name":"add","arguments":{"a":2,"b":2}}}]},"done":false}"#;
        let fragments = OllamaDialect.parse_chunk(line, true);
        assert_eq!(fragments.len(), 1);

        let shard = fragments[0]
            .tool_call_delta
            .as_ref()
            .expect("shard expected");
        assert_eq!(shard.index, 0);
        assert_eq!(shard.id.as_deref(), Some("tool_call_0"));
        assert_eq!(shard.name.as_deref(), Some("add"));
        let arguments: Value =
            serde_json::from_str(&shard.arguments_delta).expect("arguments round-trip");
        assert_eq!(arguments["a"], 2);
    }

    #[test]
    fn malformed_line_yields_note() {
        let fragments = OllamaDialect.parse_chunk("{broken", true);
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].note.is_some());
    }

    #[test]
    fn build_request_uses_native_option_names() {
        let config = ProviderConfig {
            dialect: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            api_key: None,
            options: GenerationOptions::default()
                .with_temperature(0.1)
                .with_max_tokens(64)
                .enable_streaming(),
        };
        let messages = vec![Message::user("hi")];

        let body = OllamaDialect
            .build_request(&RequestContext {
                config: &config,
                messages: &messages,
                tools: &[],
            })
            .expect("request should build");

        assert_eq!(body["model"], "llama3");
        assert_eq!(body["stream"], true);
        assert_eq!(body["options"]["temperature"], 0.1_f32 as f64);
        assert_eq!(body["options"]["num_predict"], 64);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn parse_models_reads_tag_listing() {
        let body = r#"{"models":[{"name":"llama3:8b"},{"name":"qwen2.5-coder"}]}"#;
        let models = OllamaDialect.parse_models(body).expect("listing should parse");
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id, "llama3:8b");
    }
}
