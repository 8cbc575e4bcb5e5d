use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use fchat::TurnRuntimeHooks;
use fcommon::ConversationId;
use fprovider::{Message, ProviderError, ProviderId, ProviderOperationHooks};
use ftooling::{DispatchOutcome, FunctionDispatchHooks, FunctionError, FunctionExecutionContext};

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
    fn on_attempt_start(&self, provider: &ProviderId, operation: &str, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(provider, operation, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        provider: &ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(provider, operation, attempt, delay, error)
        }));
    }

    fn on_success(&self, provider: &ProviderId, operation: &str, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(provider, operation, attempts)
        }));
    }

    fn on_failure(
        &self,
        provider: &ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(provider, operation, attempts, error)
        }));
    }
}

pub struct SafeDispatchHooks<H> {
    inner: H,
}

impl<H> SafeDispatchHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> FunctionDispatchHooks for SafeDispatchHooks<H>
where
    H: FunctionDispatchHooks,
{
    fn on_dispatch_start(
        &self,
        function_name: &str,
        call: &Message,
        context: &FunctionExecutionContext,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_dispatch_start(function_name, call, context)
        }));
    }

    fn on_dispatch_success(
        &self,
        function_name: &str,
        context: &FunctionExecutionContext,
        outcome: &DispatchOutcome,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_dispatch_success(function_name, context, outcome, elapsed)
        }));
    }

    fn on_dispatch_failure(
        &self,
        function_name: &str,
        context: &FunctionExecutionContext,
        error: &FunctionError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_dispatch_failure(function_name, context, error, elapsed)
        }));
    }
}

pub struct SafeTurnHooks<H> {
    inner: H,
}

impl<H> SafeTurnHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> TurnRuntimeHooks for SafeTurnHooks<H>
where
    H: TurnRuntimeHooks,
{
    fn on_agent_start(&self, conversation_id: &ConversationId, agent_id: &str, depth: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_agent_start(conversation_id, agent_id, depth)
        }));
    }

    fn on_recursion_limit(
        &self,
        conversation_id: &ConversationId,
        agent_id: &str,
        depth: u32,
        max_depth: u32,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_recursion_limit(conversation_id, agent_id, depth, max_depth)
        }));
    }

    fn on_model_failure(
        &self,
        conversation_id: &ConversationId,
        agent_id: &str,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_model_failure(conversation_id, agent_id, error)
        }));
    }

    fn on_function_dispatch(
        &self,
        conversation_id: &ConversationId,
        agent_id: &str,
        function_name: &str,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_function_dispatch(conversation_id, agent_id, function_name)
        }));
    }

    fn on_reply_committed(&self, conversation_id: &ConversationId, agent_id: &str, entry: &Message) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_reply_committed(conversation_id, agent_id, entry)
        }));
    }
}
