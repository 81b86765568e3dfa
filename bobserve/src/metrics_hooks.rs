//! Metrics-based observability hooks for provider, tool runtime, and
//! engine phases.
//!
//! ```rust
//! use bobserve::MetricsObservabilityHooks;
//! use bprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_provider_hooks(&hooks);
//! ```

use std::time::Duration;

use bchat::ChatEngineHooks;
use bcommon::SessionId;
use bprovider::{ProviderError, ProviderOperationHooks, ToolCall};
use btooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, dialect: &str, operation: &str, _attempt: u32) {
        metrics::counter!(
            "banter_provider_attempt_start_total",
            "dialect" => dialect.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        dialect: &str,
        operation: &str,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "banter_provider_retry_scheduled_total",
            "dialect" => dialect.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "banter_provider_retry_delay_seconds",
            "dialect" => dialect.to_string(),
            "operation" => operation.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, dialect: &str, operation: &str, attempts: u32) {
        metrics::counter!(
            "banter_provider_success_total",
            "dialect" => dialect.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "banter_provider_attempts_per_success",
            "dialect" => dialect.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(&self, dialect: &str, operation: &str, attempts: u32, error: &ProviderError) {
        metrics::counter!(
            "banter_provider_failure_total",
            "dialect" => dialect.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "banter_provider_attempts_per_failure",
            "dialect" => dialect.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }
}

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_execution_start(&self, tool_call: &ToolCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "banter_tool_execution_start_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "banter_tool_execution_success_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
        metrics::histogram!(
            "banter_tool_execution_duration_seconds",
            "tool_name" => tool_call.name.clone(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "banter_tool_execution_failure_total",
            "tool_name" => tool_call.name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "banter_tool_execution_duration_seconds",
            "tool_name" => tool_call.name.clone(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl ChatEngineHooks for MetricsObservabilityHooks {
    fn on_exchange_start(&self, _session_id: &SessionId) {
        metrics::counter!("banter_engine_exchange_start_total").increment(1);
    }

    fn on_round_start(&self, _session_id: &SessionId, _round: usize) {
        metrics::counter!("banter_engine_round_start_total").increment(1);
    }

    fn on_round_complete(&self, _session_id: &SessionId, _round: usize, resolved_calls: usize) {
        metrics::counter!("banter_engine_round_complete_total").increment(1);
        metrics::histogram!("banter_engine_resolved_calls_per_round")
            .record(resolved_calls as f64);
    }

    fn on_exchange_complete(&self, _session_id: &SessionId, status: u16, elapsed: Duration) {
        metrics::counter!(
            "banter_engine_exchange_complete_total",
            "status" => status.to_string()
        )
        .increment(1);
        metrics::histogram!("banter_engine_exchange_duration_seconds")
            .record(elapsed.as_secs_f64());
    }
}
