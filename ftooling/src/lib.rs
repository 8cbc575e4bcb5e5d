//! Function registration and dispatch for model-requested calls.

mod args;
mod dispatcher;
mod error;
mod function;
mod hooks;
mod registry;
mod types;

pub mod prelude {
    pub use crate::{
        DefaultFunctionDispatcher, DispatchOutcome, Function, FunctionDispatcher, FunctionError,
        FunctionErrorKind, FunctionExecutionContext, FunctionFuture, FunctionOutput,
        FunctionRegistry,
    };
}

pub use args::{parse_json_object, parse_json_value, required_string};
pub use dispatcher::{DefaultFunctionDispatcher, FunctionDispatcher};
pub use error::{FunctionError, FunctionErrorKind};
pub use function::{FnFunction, Function, FunctionFuture};
pub use hooks::{FunctionDispatchHooks, NoopFunctionDispatchHooks};
pub use registry::FunctionRegistry;
pub use types::{DispatchOutcome, FunctionExecutionContext, FunctionOutput};
