//! Function registry keyed by definition name.

use std::future::Future;
use std::sync::Arc;

use fcommon::Registry;
use fprovider::FunctionDefinition;

use crate::{FnFunction, Function, FunctionError, FunctionExecutionContext, FunctionOutput};

#[derive(Default, Clone)]
pub struct FunctionRegistry {
    functions: Registry<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self, function: T)
    where
        T: Function + 'static,
    {
        let name = function.definition().name;
        self.functions.insert(name, Arc::new(function));
    }

    pub fn register_fn<F, Fut>(&mut self, definition: FunctionDefinition, handler: F)
    where
        F: Fn(String, FunctionExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<FunctionOutput, FunctionError>> + Send + 'static,
    {
        self.register(FnFunction::new(definition, handler));
    }

    pub fn register_sync_fn<F>(&mut self, definition: FunctionDefinition, handler: F)
    where
        F: Fn(String, FunctionExecutionContext) -> Result<FunctionOutput, FunctionError>
            + Send
            + Sync
            + 'static,
    {
        self.register_fn(definition, move |args_json, context| {
            let output = handler(args_json, context);
            async move { output }
        });
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.remove(name)
    }

    pub fn definitions(&self) -> Vec<FunctionDefinition> {
        self.functions
            .values()
            .map(|function| function.definition())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
