//! Common `fprovider` imports for downstream crates.

pub use crate::{
    Agent, AgentType, BoxedEventStream, FunctionCall, FunctionDefinition, LlmConfig, Message,
    ModelEventStream, ModelProvider, ModelRequest, ModelRequestBuilder, ModelResponse,
    NoopOperationHooks, OutputItem, ProviderError, ProviderErrorKind, ProviderId,
    ProviderOperationHooks, ProviderRegistry, RetryPolicy, Role, StopReason, StreamEvent,
    TokenUsage, execute_with_retry,
};
pub use fcommon::{BoxFuture, MetadataMap};
