//! Ordered, failure-isolated execution of context providers.

use std::any::Any;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use fcommon::{BoxFuture, CancellationToken, run_bounded};
use futures_util::FutureExt;

use crate::{
    AiContext, ContextError, ContextErrorKind, ContextPhase, ContextProvider, InvokedContext,
    InvokingContext,
};

/// Runs registered providers before and after each model call.
///
/// The provider list is fixed at construction and sorted by priority; ties keep
/// registration order.
#[derive(Clone, Default)]
pub struct ContextOrchestrator {
    providers: Vec<Arc<dyn ContextProvider>>,
    hook_timeout: Option<Duration>,
}

impl ContextOrchestrator {
    pub fn new(providers: Vec<Arc<dyn ContextProvider>>) -> Self {
        Self::builder().providers(providers).build()
    }

    pub fn builder() -> ContextOrchestratorBuilder {
        ContextOrchestratorBuilder::default()
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn hook_timeout(&self) -> Option<Duration> {
        self.hook_timeout
    }

    /// Runs every provider's pre-call hook in ascending priority and merges what
    /// they contribute. A failing provider is logged and skipped. Once `cancel`
    /// fires no further provider starts; merges already made are kept.
    pub async fn run_pre_call(
        &self,
        context: &InvokingContext<'_>,
        cancel: &CancellationToken,
    ) -> AiContext {
        let mut aggregate = AiContext::new();

        for provider in &self.providers {
            if cancel.is_cancelled() {
                tracing::debug!(
                    phase = "context",
                    event = "pre_call_cancelled",
                    provider = provider.name(),
                );
                break;
            }

            let contribution = self
                .guard(provider.as_ref(), ContextPhase::PreCall, cancel, || {
                    provider.on_invoking(context, cancel)
                })
                .await;

            if let Some(Some(contribution)) = contribution {
                tracing::debug!(
                    phase = "context",
                    event = "contribution_merged",
                    provider = provider.name(),
                    messages = contribution.messages.len(),
                    has_instruction = contribution.system_instruction.is_some(),
                );
                aggregate.merge(contribution);
            }
        }

        aggregate
    }

    /// Runs every provider's post-call hook in descending priority. Failures are
    /// logged and never reach the caller.
    pub async fn run_post_call(&self, context: &InvokedContext<'_>, cancel: &CancellationToken) {
        for provider in self.providers.iter().rev() {
            if cancel.is_cancelled() {
                tracing::debug!(
                    phase = "context",
                    event = "post_call_cancelled",
                    provider = provider.name(),
                );
                break;
            }

            self.guard(provider.as_ref(), ContextPhase::PostCall, cancel, || {
                provider.on_invoked(context, cancel)
            })
            .await;
        }
    }

    async fn guard<'a, T, F>(
        &self,
        provider: &dyn ContextProvider,
        phase: ContextPhase,
        cancel: &CancellationToken,
        start: F,
    ) -> Option<T>
    where
        F: FnOnce() -> BoxFuture<'a, Result<T, ContextError>>,
    {
        let error = match catch_unwind(AssertUnwindSafe(start)) {
            Ok(hook) => match bounded(hook, cancel, self.hook_timeout).await {
                Ok(value) => return Some(value),
                Err(error) => error,
            },
            Err(payload) => ContextError::panicked(panic_message(payload.as_ref())),
        }
        .with_provider(provider.name());

        if error.kind == ContextErrorKind::Cancelled {
            tracing::debug!(
                phase = "context",
                event = "hook_cancelled",
                provider = provider.name(),
                hook = phase.as_str(),
            );
        } else {
            tracing::warn!(
                phase = "context",
                event = "provider_failed",
                provider = provider.name(),
                hook = phase.as_str(),
                kind = ?error.kind,
                error = %error,
            );
        }

        None
    }
}

async fn bounded<T, F>(
    hook: F,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<T, ContextError>
where
    F: Future<Output = Result<T, ContextError>>,
{
    match run_bounded(AssertUnwindSafe(hook).catch_unwind(), cancel, timeout).await {
        Ok(Ok(result)) => result,
        Ok(Err(payload)) => Err(ContextError::panicked(panic_message(payload.as_ref()))),
        Err(interrupted) => Err(interrupted.into()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "provider hook panicked".to_string()
    }
}

#[derive(Default)]
pub struct ContextOrchestratorBuilder {
    providers: Vec<Arc<dyn ContextProvider>>,
    hook_timeout: Option<Duration>,
}

impl ContextOrchestratorBuilder {
    pub fn provider<P>(self, provider: P) -> Self
    where
        P: ContextProvider + 'static,
    {
        self.provider_arc(Arc::new(provider))
    }

    pub fn provider_arc(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn providers(mut self, providers: Vec<Arc<dyn ContextProvider>>) -> Self {
        self.providers.extend(providers);
        self
    }

    pub fn hook_timeout(mut self, timeout: Duration) -> Self {
        self.hook_timeout = Some(timeout);
        self
    }

    pub fn build(mut self) -> ContextOrchestrator {
        self.providers.sort_by_key(|provider| provider.priority());

        ContextOrchestrator {
            providers: self.providers,
            hook_timeout: self.hook_timeout,
        }
    }
}
