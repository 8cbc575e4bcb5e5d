//! Unified facade over the switchboard workspace crates.
//!
//! This crate is meant to be the single dependency for most applications.
//! It re-exports the engine crates and adds wiring helpers and macros for
//! common setup and dialog-building flows.

mod macros;

pub mod agent;
pub mod prelude;
pub mod runtime;
pub mod util;

pub use fchat;
pub use fcommon;
pub use fcontext;
pub use fmemory;
pub use fobserve;
pub use fprovider;
pub use ftooling;

pub use fchat::{
    AgentLoader, CONTENT_FILTER_TEXT, ChatError, ChatErrorKind, ChatErrorPhase, ChatEvent,
    ChatEventObserver, ChatPolicy, ChatService, ChatServiceBuilder, InMemoryAgentRegistry,
    InvokeAgentOptions, MODEL_FAILURE_TEXT, NoopResponseTemplates, NoopTurnRuntimeHooks,
    ROUTING_FALLBACK_TEXT, ResponseTemplateRenderer, StaticResponseTemplates, TurnContext,
    TurnOutcome, TurnRuntimeHooks, normalize_function_name,
};
pub use fcommon::{
    BoxFuture, CancellationToken, ConversationId, Interrupted, MetadataMap, TraceId, run_bounded,
};
pub use fcontext::{
    AiContext, CONVERSATION_HISTORY_INSTRUCTION, ContextError, ContextErrorKind,
    ContextOrchestrator, ContextOrchestratorBuilder, ContextPhase, ContextProvider,
    ConversationMemoryProvider, InvokedContext, InvokingContext,
};
pub use fmemory::{
    ConversationStateStore, ConversationStates, ConversationStore, FilesystemConversationStore,
    InMemoryConversationStore, InMemoryStateStore, MemoryError, MemoryErrorKind,
    states_from_args,
};
pub use fobserve::{
    MetricsObservabilityHooks, SafeDispatchHooks, SafeProviderHooks, SafeTurnHooks,
    TracingObservabilityHooks,
};
pub use fprovider::{
    Agent, AgentType, BoxedEventStream, DEFAULT_MAX_RECURSION_DEPTH, FunctionCall,
    FunctionDefinition, LlmConfig, Message, ModelEventStream, ModelProvider, ModelRequest,
    ModelRequestBuilder, ModelResponse, NoopOperationHooks, OutputItem, ProviderError,
    ProviderErrorKind, ProviderFuture, ProviderId, ProviderOperationHooks, ProviderRegistry,
    RetryPolicy, Role, StopReason, StreamEvent, TokenUsage, VecEventStream, execute_with_retry,
};
pub use ftooling::{
    DefaultFunctionDispatcher, DispatchOutcome, FnFunction, Function, FunctionDispatchHooks,
    FunctionDispatcher, FunctionError, FunctionErrorKind, FunctionExecutionContext,
    FunctionFuture, FunctionOutput, FunctionRegistry, NoopFunctionDispatchHooks,
    parse_json_object, parse_json_value, required_string,
};

pub use agent::{AgentRuntime, AgentRuntimeBuilder};
pub use runtime::{
    RuntimeBundle, build_runtime, build_runtime_with, build_runtime_with_functions,
    build_runtime_with_memory, chat_service, chat_service_with_memory, in_memory_states,
    in_memory_store,
};
pub use util::{
    agent, assistant_message, function_definition, streaming_options, system_message, turn,
    user_message,
};
