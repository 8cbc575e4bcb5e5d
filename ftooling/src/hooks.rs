//! Lifecycle hooks around function dispatch.
//!
//! ```rust
//! use ftooling::{FunctionDispatchHooks, NoopFunctionDispatchHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn FunctionDispatchHooks) {}
//!
//! assert_hooks_trait(&NoopFunctionDispatchHooks);
//! ```

use std::time::Duration;

use fprovider::Message;

use crate::{DispatchOutcome, FunctionError, FunctionExecutionContext};

pub trait FunctionDispatchHooks: Send + Sync {
    fn on_dispatch_start(
        &self,
        _function_name: &str,
        _call: &Message,
        _context: &FunctionExecutionContext,
    ) {
    }

    fn on_dispatch_success(
        &self,
        _function_name: &str,
        _context: &FunctionExecutionContext,
        _outcome: &DispatchOutcome,
        _elapsed: Duration,
    ) {
    }

    fn on_dispatch_failure(
        &self,
        _function_name: &str,
        _context: &FunctionExecutionContext,
        _error: &FunctionError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFunctionDispatchHooks;

impl FunctionDispatchHooks for NoopFunctionDispatchHooks {}
