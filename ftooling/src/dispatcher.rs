//! Function dispatcher contract and the registry-backed default.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fcommon::run_bounded;
use fprovider::Message;

use crate::{
    DispatchOutcome, FunctionDispatchHooks, FunctionError, FunctionExecutionContext,
    FunctionFuture, FunctionRegistry, NoopFunctionDispatchHooks,
};

/// Executes a named function for a function-role call entry.
///
/// `call` carries the tool-call id and the raw argument payload; `function_name`
/// is already normalized by the caller.
pub trait FunctionDispatcher: Send + Sync {
    fn dispatch<'a>(
        &'a self,
        function_name: &'a str,
        call: &'a Message,
        context: &'a FunctionExecutionContext,
    ) -> FunctionFuture<'a, Result<DispatchOutcome, FunctionError>>;
}

#[derive(Clone)]
pub struct DefaultFunctionDispatcher {
    registry: Arc<FunctionRegistry>,
    hooks: Arc<dyn FunctionDispatchHooks>,
    timeout: Option<Duration>,
}

impl Default for DefaultFunctionDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(FunctionRegistry::new()))
    }
}

impl DefaultFunctionDispatcher {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopFunctionDispatchHooks),
            timeout: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn FunctionDispatchHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> Arc<FunctionRegistry> {
        Arc::clone(&self.registry)
    }

    async fn run(
        &self,
        function_name: &str,
        call: &Message,
        context: &FunctionExecutionContext,
    ) -> Result<DispatchOutcome, FunctionError> {
        let function = self.registry.get(function_name).ok_or_else(|| {
            FunctionError::not_found(format!("function '{function_name}' is not registered"))
        })?;

        let args_json = call.function_args.as_deref().unwrap_or("{}");
        let output = run_bounded(
            function.invoke(args_json, context),
            &context.cancel,
            self.timeout,
        )
        .await??;

        Ok(DispatchOutcome::from_output(call, output))
    }
}

impl FunctionDispatcher for DefaultFunctionDispatcher {
    fn dispatch<'a>(
        &'a self,
        function_name: &'a str,
        call: &'a Message,
        context: &'a FunctionExecutionContext,
    ) -> FunctionFuture<'a, Result<DispatchOutcome, FunctionError>> {
        Box::pin(async move {
            let started = Instant::now();
            self.hooks.on_dispatch_start(function_name, call, context);

            match self.run(function_name, call, context).await {
                Ok(outcome) => {
                    self.hooks.on_dispatch_success(
                        function_name,
                        context,
                        &outcome,
                        started.elapsed(),
                    );
                    Ok(outcome)
                }
                Err(error) => {
                    let mut error = error.with_function_name(function_name);
                    if let Some(call_id) = call.tool_call_id.as_deref() {
                        error = error.with_tool_call_id(call_id);
                    }
                    self.hooks
                        .on_dispatch_failure(function_name, context, &error, started.elapsed());
                    Err(error)
                }
            }
        })
    }
}
