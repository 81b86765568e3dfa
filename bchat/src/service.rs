//! Chat service: the bounded request/tool-execution loop of one exchange.

use std::sync::Arc;
use std::time::Instant;

use bcommon::RequestId;
use bprovider::{
    ChatTransport, CredentialStore, DialectRegistry, Message, ModelInfo, ProviderConfig,
    SecretString,
};
use btooling::{ToolExecutionContext, ToolRuntime};
use tokio_util::sync::CancellationToken;

use crate::{
    CancelController, ChatEngineHooks, ChatError, ExchangeRequest, NoopChatEngineHooks,
    RoundDriver, TurnAccumulator, TurnObserver, TurnUpdate,
};

/// Engine-level limits for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatPolicy {
    /// Upper bound on tool sub-rounds; a model that keeps requesting tools
    /// past this bound fails the exchange instead of looping forever.
    pub max_tool_rounds: usize,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self { max_tool_rounds: 8 }
    }
}

impl ChatPolicy {
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.max_tool_rounds == 0 {
            return Err(ChatError::invalid_request(
                "max_tool_rounds must be at least 1",
            ));
        }

        Ok(())
    }
}

pub struct ChatService {
    dialects: Arc<DialectRegistry>,
    transport: Arc<dyn ChatTransport>,
    tool_runtime: Option<Arc<dyn ToolRuntime>>,
    credentials: Option<Arc<CredentialStore>>,
    policy: ChatPolicy,
    hooks: Arc<dyn ChatEngineHooks>,
}

pub struct ChatServiceBuilder {
    dialects: Arc<DialectRegistry>,
    transport: Arc<dyn ChatTransport>,
    tool_runtime: Option<Arc<dyn ToolRuntime>>,
    credentials: Option<Arc<CredentialStore>>,
    policy: ChatPolicy,
    hooks: Arc<dyn ChatEngineHooks>,
}

impl ChatServiceBuilder {
    pub fn new(dialects: Arc<DialectRegistry>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            dialects,
            transport,
            tool_runtime: None,
            credentials: None,
            policy: ChatPolicy::default(),
            hooks: Arc::new(NoopChatEngineHooks),
        }
    }

    pub fn tool_runtime(mut self, tool_runtime: Arc<dyn ToolRuntime>) -> Self {
        self.tool_runtime = Some(tool_runtime);
        self
    }

    pub fn credentials(mut self, credentials: Arc<CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.policy.max_tool_rounds = max_tool_rounds;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn ChatEngineHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> ChatService {
        ChatService {
            dialects: self.dialects,
            transport: self.transport,
            tool_runtime: self.tool_runtime,
            credentials: self.credentials,
            policy: self.policy,
            hooks: self.hooks,
        }
    }
}

impl ChatService {
    pub fn builder(
        dialects: Arc<DialectRegistry>,
        transport: Arc<dyn ChatTransport>,
    ) -> ChatServiceBuilder {
        ChatServiceBuilder::new(dialects, transport)
    }

    /// Runs one complete exchange: rounds against the endpoint, tool
    /// execution between rounds, and exactly one terminal update.
    ///
    /// Every outcome, success or failure, is reported through `observer`
    /// (terminal update last, with `finished` set) and returned; errors are
    /// never propagated past this boundary. The conversation is mutated
    /// only by appending, only between rounds: a matched assistant/tool
    /// message pair per executed call, then the final assistant turn on
    /// success.
    pub async fn run_exchange(
        &self,
        request: ExchangeRequest,
        conversation: &mut Vec<Message>,
        cancel: &CancelController,
        observer: &TurnObserver,
    ) -> TurnUpdate {
        let started_at = Instant::now();
        self.hooks.on_exchange_start(&request.session.id);

        // Installing the exchange token cancels any prior in-flight round.
        let token = cancel.begin();

        let mut accumulator = TurnAccumulator::new();

        // Placeholder turn so the caller can render a thinking state
        // before the first fragment arrives.
        observer(TurnUpdate {
            message: Message::assistant(""),
            status: 200,
            detail: None,
            finished: false,
        });

        let outcome = self
            .run_rounds(&request, conversation, &mut accumulator, &token, observer)
            .await;

        accumulator.mark_done();
        let update = match outcome {
            Ok(()) => TurnUpdate {
                message: accumulator.snapshot(),
                status: 200,
                detail: accumulator.last_note().map(ToString::to_string),
                finished: true,
            },
            Err(error) => TurnUpdate {
                message: accumulator.snapshot(),
                status: error.status(),
                detail: Some(error.message),
                finished: true,
            },
        };

        observer(update.clone());
        self.hooks
            .on_exchange_complete(&request.session.id, update.status, started_at.elapsed());
        update
    }

    /// Lists the models the configured endpoint serves.
    pub async fn list_models(&self, config: &ProviderConfig) -> Result<Vec<ModelInfo>, ChatError> {
        let dialect = self.dialects.get(&config.dialect).ok_or_else(|| {
            ChatError::invalid_request(format!("unknown dialect '{}'", config.dialect))
        })?;

        let api_key = self.resolve_api_key(config)?;
        let url = config.endpoint(dialect.models_path());
        let body = self.transport.get_models(&url, api_key.as_ref()).await?;

        dialect.parse_models(&body).map_err(ChatError::from)
    }

    async fn run_rounds(
        &self,
        request: &ExchangeRequest,
        conversation: &mut Vec<Message>,
        accumulator: &mut TurnAccumulator,
        token: &CancellationToken,
        observer: &TurnObserver,
    ) -> Result<(), ChatError> {
        self.policy.validate()?;
        request.config.validate()?;

        let dialect = self.dialects.get(&request.config.dialect).ok_or_else(|| {
            ChatError::invalid_request(format!("unknown dialect '{}'", request.config.dialect))
        })?;

        let mut config = request.config.clone();
        config.api_key = self.resolve_api_key(&config)?;

        // Tools are described to the model once per exchange. Being unable
        // to describe them is terminal: the model was promised capabilities
        // it cannot have.
        let tools = match &self.tool_runtime {
            Some(runtime) => runtime
                .load_tools(&request.tool_servers)
                .await
                .map_err(ChatError::from)?,
            None => Vec::new(),
        };

        for round in 0..self.policy.max_tool_rounds {
            self.hooks.on_round_start(&request.session.id, round);

            let driver = RoundDriver {
                transport: self.transport.as_ref(),
                dialect: dialect.as_ref(),
                config: &config,
                tools: &tools,
            };
            let messages = self.outbound_messages(request, conversation);
            driver.drive(&messages, accumulator, token, observer).await?;

            let calls = accumulator.resolved_calls();
            self.hooks
                .on_round_complete(&request.session.id, round, calls.len());

            if calls.is_empty() {
                conversation.push(accumulator.snapshot());
                return Ok(());
            }

            let context = ToolExecutionContext::new(request.session.id.clone())
                .with_request_id(RequestId::for_round(&request.session.id, round));

            for call in calls {
                let output = match &self.tool_runtime {
                    Some(runtime) => match runtime.execute(call.clone(), context.clone()).await {
                        Ok(result) => result.into_tool_result(),
                        // A failed call is local: its failure text becomes
                        // the tool message so the model can react to it.
                        Err(error) => bprovider::ToolResult {
                            tool_call_id: call.id.clone(),
                            output: format!("tool execution failed: {error}"),
                        },
                    },
                    None => bprovider::ToolResult {
                        tool_call_id: call.id.clone(),
                        output: "tool execution is not configured".to_string(),
                    },
                };

                conversation.push(Message::assistant_tool_call(call));
                conversation.push(Message::tool_result(output));
            }

            observer(TurnUpdate {
                message: accumulator.snapshot(),
                status: 200,
                detail: accumulator.last_note().map(ToString::to_string),
                finished: false,
            });

            accumulator.clear_tool_calls();

            if token.is_cancelled() {
                return Err(ChatError::aborted("exchange terminated between rounds"));
            }
        }

        Err(ChatError::too_many_rounds(format!(
            "exchange exceeded {} tool rounds",
            self.policy.max_tool_rounds
        )))
    }

    fn outbound_messages(
        &self,
        request: &ExchangeRequest,
        conversation: &[Message],
    ) -> Vec<Message> {
        match &request.session.system_prompt {
            Some(system_prompt) => {
                let mut messages = Vec::with_capacity(conversation.len() + 1);
                messages.push(Message::system(system_prompt.clone()));
                messages.extend_from_slice(conversation);
                messages
            }
            None => conversation.to_vec(),
        }
    }

    fn resolve_api_key(
        &self,
        config: &ProviderConfig,
    ) -> Result<Option<SecretString>, ChatError> {
        if config.api_key.is_some() {
            return Ok(config.api_key.clone());
        }

        match &self.credentials {
            Some(store) => store.api_key(&config.dialect).map_err(ChatError::from),
            None => Ok(None),
        }
    }
}
