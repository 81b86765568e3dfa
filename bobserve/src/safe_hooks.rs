use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use bchat::ChatEngineHooks;
use bcommon::SessionId;
use bprovider::{ProviderError, ProviderOperationHooks, ToolCall};
use btooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_attempt_start(&self, dialect: &str, operation: &str, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(dialect, operation, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        dialect: &str,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(dialect, operation, attempt, delay, error)
        }));
    }

    fn on_success(&self, dialect: &str, operation: &str, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(dialect, operation, attempts)
        }));
    }

    fn on_failure(&self, dialect: &str, operation: &str, attempts: u32, error: &ProviderError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(dialect, operation, attempts, error)
        }));
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_execution_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_execution_start(tool_call, context)
        }));
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_success(tool_call, context, result, elapsed)
        }));
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_failure(tool_call, context, error, elapsed)
        }));
    }
}

pub struct SafeChatHooks<H> {
    inner: H,
}

impl<H> SafeChatHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ChatEngineHooks for SafeChatHooks<H>
where
    H: ChatEngineHooks,
{
    fn on_exchange_start(&self, session_id: &SessionId) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_exchange_start(session_id)
        }));
    }

    fn on_round_start(&self, session_id: &SessionId, round: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_round_start(session_id, round)
        }));
    }

    fn on_round_complete(&self, session_id: &SessionId, round: usize, resolved_calls: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_round_complete(session_id, round, resolved_calls)
        }));
    }

    fn on_exchange_complete(&self, session_id: &SessionId, status: u16, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_exchange_complete(session_id, status, elapsed)
        }));
    }
}
