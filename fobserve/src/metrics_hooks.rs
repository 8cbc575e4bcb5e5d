//! Metrics-based hooks for provider attempts, function dispatch and turn progress.
//!
//! ```rust
//! use fobserve::MetricsObservabilityHooks;
//! use fprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_provider_hooks(&hooks);
//! ```

use std::time::Duration;

use fchat::TurnRuntimeHooks;
use fcommon::ConversationId;
use fprovider::{Message, ProviderError, ProviderId, ProviderOperationHooks};
use ftooling::{DispatchOutcome, FunctionDispatchHooks, FunctionError, FunctionExecutionContext};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: &ProviderId, operation: &str, _attempt: u32) {
        metrics::counter!(
            "switchboard_provider_attempt_start_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        provider: &ProviderId,
        operation: &str,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "switchboard_provider_retry_scheduled_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "switchboard_provider_retry_delay_seconds",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, provider: &ProviderId, operation: &str, attempts: u32) {
        metrics::counter!(
            "switchboard_provider_success_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "switchboard_provider_attempts_per_success",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(
        &self,
        provider: &ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "switchboard_provider_failure_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "switchboard_provider_attempts_per_failure",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }
}

impl FunctionDispatchHooks for MetricsObservabilityHooks {
    fn on_dispatch_start(
        &self,
        function_name: &str,
        _call: &Message,
        _context: &FunctionExecutionContext,
    ) {
        metrics::counter!(
            "switchboard_function_dispatch_start_total",
            "function" => function_name.to_string()
        )
        .increment(1);
    }

    fn on_dispatch_success(
        &self,
        function_name: &str,
        _context: &FunctionExecutionContext,
        outcome: &DispatchOutcome,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "switchboard_function_dispatch_success_total",
            "function" => function_name.to_string(),
            "stop" => outcome.stop.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "switchboard_function_dispatch_duration_seconds",
            "function" => function_name.to_string(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_dispatch_failure(
        &self,
        function_name: &str,
        _context: &FunctionExecutionContext,
        error: &FunctionError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "switchboard_function_dispatch_failure_total",
            "function" => function_name.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "switchboard_function_dispatch_duration_seconds",
            "function" => function_name.to_string(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl TurnRuntimeHooks for MetricsObservabilityHooks {
    fn on_agent_start(&self, _conversation_id: &ConversationId, agent_id: &str, depth: u32) {
        metrics::counter!("switchboard_turn_agent_start_total", "agent_id" => agent_id.to_string())
            .increment(1);
        metrics::histogram!("switchboard_turn_recursion_depth", "agent_id" => agent_id.to_string())
            .record(depth as f64);
    }

    fn on_recursion_limit(
        &self,
        _conversation_id: &ConversationId,
        agent_id: &str,
        _depth: u32,
        _max_depth: u32,
    ) {
        metrics::counter!(
            "switchboard_turn_recursion_limit_total",
            "agent_id" => agent_id.to_string()
        )
        .increment(1);
    }

    fn on_model_failure(
        &self,
        _conversation_id: &ConversationId,
        agent_id: &str,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "switchboard_turn_model_failure_total",
            "agent_id" => agent_id.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }

    fn on_function_dispatch(
        &self,
        _conversation_id: &ConversationId,
        agent_id: &str,
        function_name: &str,
    ) {
        metrics::counter!(
            "switchboard_turn_function_dispatch_total",
            "agent_id" => agent_id.to_string(),
            "function" => function_name.to_string()
        )
        .increment(1);
    }

    fn on_reply_committed(&self, _conversation_id: &ConversationId, agent_id: &str, entry: &Message) {
        metrics::counter!(
            "switchboard_turn_reply_committed_total",
            "agent_id" => agent_id.to_string(),
            "role" => entry.role.to_string()
        )
        .increment(1);
    }
}
