//! Common imports for most switchboard applications.

pub use crate::{
    agent, assistant_message, build_runtime, build_runtime_with, build_runtime_with_functions,
    build_runtime_with_memory, chat_service, chat_service_with_memory, function_definition,
    in_memory_states, in_memory_store, streaming_options, system_message, turn, user_message,
};
pub use crate::{sb_agent, sb_messages, sb_msg};
pub use crate::{
    Agent, AgentRuntime, AgentRuntimeBuilder, AgentType, AiContext, BoxFuture, CancellationToken,
    ChatError, ChatErrorKind, ChatErrorPhase, ChatEvent, ChatEventObserver, ChatPolicy,
    ChatService, ChatServiceBuilder, ContextError, ContextOrchestrator, ContextProvider,
    ConversationId, ConversationMemoryProvider, ConversationStateStore, ConversationStore,
    FunctionCall, FunctionDefinition, FunctionError, FunctionExecutionContext, FunctionOutput,
    FunctionRegistry, InMemoryConversationStore, InvokeAgentOptions, InvokedContext,
    InvokingContext, LlmConfig, Message, ModelProvider, ModelRequest, ProviderError, ProviderId,
    Role, RuntimeBundle, StaticResponseTemplates, TurnContext, TurnOutcome,
};
