//! Function trait contract for registry-managed capabilities.
//!
//! ```rust
//! use fprovider::FunctionDefinition;
//! use ftooling::{FnFunction, Function, FunctionOutput};
//!
//! let function = FnFunction::new(
//!     FunctionDefinition {
//!         name: "echo".to_string(),
//!         description: "Echoes input".to_string(),
//!         input_schema: r#"{"type":"object"}"#.to_string(),
//!     },
//!     |args, _ctx| async move { Ok(FunctionOutput::new(args)) },
//! );
//!
//! assert_eq!(function.definition().name, "echo");
//! ```

use std::future::Future;
use std::sync::Arc;

use fcommon::BoxFuture;
use fprovider::FunctionDefinition;

use crate::{FunctionError, FunctionExecutionContext, FunctionOutput};

pub type FunctionFuture<'a, T> = BoxFuture<'a, T>;

pub trait Function: Send + Sync {
    fn definition(&self) -> FunctionDefinition;

    fn invoke<'a>(
        &'a self,
        args_json: &'a str,
        context: &'a FunctionExecutionContext,
    ) -> FunctionFuture<'a, Result<FunctionOutput, FunctionError>>;
}

type FunctionHandler = dyn Fn(
        String,
        FunctionExecutionContext,
    ) -> FunctionFuture<'static, Result<FunctionOutput, FunctionError>>
    + Send
    + Sync;

/// Closure-backed [`Function`].
pub struct FnFunction {
    definition: FunctionDefinition,
    handler: Arc<FunctionHandler>,
}

impl FnFunction {
    pub fn new<F, Fut>(definition: FunctionDefinition, handler: F) -> Self
    where
        F: Fn(String, FunctionExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<FunctionOutput, FunctionError>> + Send + 'static,
    {
        let handler: Arc<FunctionHandler> =
            Arc::new(move |args_json, context| Box::pin(handler(args_json, context)));

        Self {
            definition,
            handler,
        }
    }
}

impl Function for FnFunction {
    fn definition(&self) -> FunctionDefinition {
        self.definition.clone()
    }

    fn invoke<'a>(
        &'a self,
        args_json: &'a str,
        context: &'a FunctionExecutionContext,
    ) -> FunctionFuture<'a, Result<FunctionOutput, FunctionError>> {
        (self.handler)(args_json.to_string(), context.clone())
    }
}
