//! Tool runtime trait and default registry-backed executor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bprovider::{ToolCall, ToolDefinition};
use futures_util::future::{Either, select};

use crate::{
    NoopToolRuntimeHooks, ToolError, ToolExecutionContext, ToolExecutionResult, ToolFuture,
    ToolRegistry, ToolRuntimeHooks,
};

/// External tool collaborator consumed by the chat engine.
///
/// `load_tools` describes what the model may call; `execute` runs one
/// resolved call. Results keep the originating `tool_call_id` so the engine
/// can re-pair them with the calls that produced them.
pub trait ToolRuntime: Send + Sync {
    fn load_tools<'a>(
        &'a self,
        server_ids: &'a [String],
    ) -> ToolFuture<'a, Result<Vec<ToolDefinition>, ToolError>>;

    fn execute<'a>(
        &'a self,
        tool_call: ToolCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>>;
}

#[derive(Clone)]
pub struct DefaultToolRuntime {
    registry: Arc<ToolRegistry>,
    hooks: Arc<dyn ToolRuntimeHooks>,
    call_deadline: Option<Duration>,
}

impl DefaultToolRuntime {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolRuntimeHooks),
            call_deadline: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Bounds every call; a tool that runs past the deadline fails with
    /// `ToolErrorKind::Timeout` instead of stalling the exchange.
    pub fn with_call_deadline(mut self, call_deadline: Duration) -> Self {
        self.call_deadline = Some(call_deadline);
        self
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }
}

impl ToolRuntime for DefaultToolRuntime {
    fn load_tools<'a>(
        &'a self,
        server_ids: &'a [String],
    ) -> ToolFuture<'a, Result<Vec<ToolDefinition>, ToolError>> {
        Box::pin(async move { Ok(self.registry.definitions_for_sources(server_ids)) })
    }

    fn execute<'a>(
        &'a self,
        tool_call: ToolCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>> {
        Box::pin(async move {
            self.hooks.on_execution_start(&tool_call, &context);
            let started_at = Instant::now();

            let outcome = self.execute_inner(&tool_call, &context).await;
            let elapsed = started_at.elapsed();

            match &outcome {
                Ok(result) => {
                    self.hooks
                        .on_execution_success(&tool_call, &context, result, elapsed);
                }
                Err(error) => {
                    self.hooks
                        .on_execution_failure(&tool_call, &context, error, elapsed);
                }
            }

            outcome
        })
    }
}

impl DefaultToolRuntime {
    async fn execute_inner(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
    ) -> Result<ToolExecutionResult, ToolError> {
        let tool = self.registry.get(&tool_call.name).ok_or_else(|| {
            ToolError::not_found(format!("tool '{}' is not registered", tool_call.name))
                .with_tool_name(tool_call.name.clone())
                .with_tool_call_id(tool_call.id.clone())
        })?;

        let invoke = tool.invoke(&tool_call.arguments, context);
        let output = match self.call_deadline {
            Some(deadline) => match select(invoke, futures_timer::Delay::new(deadline)).await {
                Either::Left((output, _)) => output,
                Either::Right(_) => Err(ToolError::timeout(format!(
                    "tool '{}' exceeded the {}ms call deadline",
                    tool_call.name,
                    deadline.as_millis()
                ))),
            },
            None => invoke.await,
        };

        let output = output.map_err(|error| {
            error
                .with_tool_name(tool_call.name.clone())
                .with_tool_call_id(tool_call.id.clone())
        })?;

        Ok(ToolExecutionResult::from_call(tool_call, output))
    }
}
