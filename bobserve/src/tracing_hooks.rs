//! Tracing-based observability hooks for provider, tool runtime, and
//! engine phases.
//!
//! ```rust
//! use bchat::ChatEngineHooks;
//! use bobserve::TracingObservabilityHooks;
//!
//! fn accepts_engine_hooks(_hooks: &dyn ChatEngineHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_engine_hooks(&hooks);
//! ```

use std::time::Duration;

use bchat::ChatEngineHooks;
use bcommon::SessionId;
use bprovider::{ProviderError, ProviderOperationHooks, ToolCall};
use btooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, dialect: &str, operation: &str, attempt: u32) {
        tracing::info!(
            phase = "provider",
            event = "attempt_start",
            dialect,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        dialect: &str,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "provider",
            event = "retry_scheduled",
            dialect,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_success(&self, dialect: &str, operation: &str, attempts: u32) {
        tracing::info!(
            phase = "provider",
            event = "success",
            dialect,
            operation,
            attempts
        );
    }

    fn on_failure(&self, dialect: &str, operation: &str, attempts: u32, error: &ProviderError) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            dialect,
            operation,
            attempts,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "tool",
            event = "execution_start",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            session_id = %context.session_id,
            request_id = context.request_id.as_ref().map(|id| id.as_str())
        );
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "execution_success",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            session_id = %context.session_id,
            request_id = context.request_id.as_ref().map(|id| id.as_str()),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "tool",
            event = "execution_failure",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            session_id = %context.session_id,
            request_id = context.request_id.as_ref().map(|id| id.as_str()),
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl ChatEngineHooks for TracingObservabilityHooks {
    fn on_exchange_start(&self, session_id: &SessionId) {
        tracing::info!(
            phase = "engine",
            event = "exchange_start",
            session_id = %session_id
        );
    }

    fn on_round_start(&self, session_id: &SessionId, round: usize) {
        tracing::info!(
            phase = "engine",
            event = "round_start",
            session_id = %session_id,
            round
        );
    }

    fn on_round_complete(&self, session_id: &SessionId, round: usize, resolved_calls: usize) {
        tracing::info!(
            phase = "engine",
            event = "round_complete",
            session_id = %session_id,
            round,
            resolved_calls
        );
    }

    fn on_exchange_complete(&self, session_id: &SessionId, status: u16, elapsed: Duration) {
        tracing::info!(
            phase = "engine",
            event = "exchange_complete",
            session_id = %session_id,
            status,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }
}
