//! Tracing-based hooks for provider attempts, function dispatch and turn progress.
//!
//! ```rust
//! use fchat::TurnRuntimeHooks;
//! use fobserve::TracingObservabilityHooks;
//!
//! fn accepts_turn_hooks(_hooks: &dyn TurnRuntimeHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_turn_hooks(&hooks);
//! ```

use std::time::Duration;

use fchat::TurnRuntimeHooks;
use fcommon::ConversationId;
use fprovider::{Message, ProviderError, ProviderId, ProviderOperationHooks};
use ftooling::{DispatchOutcome, FunctionDispatchHooks, FunctionError, FunctionExecutionContext};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: &ProviderId, operation: &str, attempt: u32) {
        tracing::info!(
            phase = "provider",
            event = "attempt_start",
            provider = %provider,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        provider: &ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "provider",
            event = "retry_scheduled",
            provider = %provider,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_success(&self, provider: &ProviderId, operation: &str, attempts: u32) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider = %provider,
            operation,
            attempts
        );
    }

    fn on_failure(
        &self,
        provider: &ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            operation,
            attempts,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl FunctionDispatchHooks for TracingObservabilityHooks {
    fn on_dispatch_start(
        &self,
        function_name: &str,
        call: &Message,
        context: &FunctionExecutionContext,
    ) {
        tracing::info!(
            phase = "function",
            event = "dispatch_start",
            function = function_name,
            tool_call_id = call.tool_call_id.as_deref(),
            conversation_id = %context.conversation_id,
            agent_id = context.current_agent_id.as_deref(),
            trace_id = context.trace_id.as_ref().map(|id| id.as_str())
        );
    }

    fn on_dispatch_success(
        &self,
        function_name: &str,
        context: &FunctionExecutionContext,
        outcome: &DispatchOutcome,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "function",
            event = "dispatch_success",
            function = function_name,
            conversation_id = %context.conversation_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            stop = outcome.stop,
            next_agent_id = outcome.next_agent_id.as_deref(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_dispatch_failure(
        &self,
        function_name: &str,
        context: &FunctionExecutionContext,
        error: &FunctionError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "function",
            event = "dispatch_failure",
            function = function_name,
            conversation_id = %context.conversation_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl TurnRuntimeHooks for TracingObservabilityHooks {
    fn on_agent_start(&self, conversation_id: &ConversationId, agent_id: &str, depth: u32) {
        tracing::info!(
            phase = "turn",
            event = "agent_start",
            conversation_id = %conversation_id,
            agent_id,
            depth
        );
    }

    fn on_recursion_limit(
        &self,
        conversation_id: &ConversationId,
        agent_id: &str,
        depth: u32,
        max_depth: u32,
    ) {
        tracing::warn!(
            phase = "turn",
            event = "recursion_limit",
            conversation_id = %conversation_id,
            agent_id,
            depth,
            max_depth
        );
    }

    fn on_model_failure(
        &self,
        conversation_id: &ConversationId,
        agent_id: &str,
        error: &ProviderError,
    ) {
        tracing::error!(
            phase = "turn",
            event = "model_failure",
            conversation_id = %conversation_id,
            agent_id,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_function_dispatch(
        &self,
        conversation_id: &ConversationId,
        agent_id: &str,
        function_name: &str,
    ) {
        tracing::info!(
            phase = "turn",
            event = "function_dispatch",
            conversation_id = %conversation_id,
            agent_id,
            function = function_name
        );
    }

    fn on_reply_committed(&self, conversation_id: &ConversationId, agent_id: &str, entry: &Message) {
        tracing::debug!(
            phase = "turn",
            event = "reply_committed",
            conversation_id = %conversation_id,
            agent_id,
            role = %entry.role,
            stop_completion = entry.stop_completion
        );
    }
}
