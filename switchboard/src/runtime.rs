//! Runtime wiring helpers for common setups.

use std::sync::Arc;

use crate::{
    Agent, AgentRuntimeBuilder, ChatError, ChatService, ConversationMemoryProvider,
    ConversationStateStore, ConversationStore, FunctionRegistry, InMemoryConversationStore,
    InMemoryStateStore, ModelProvider,
};

#[derive(Clone)]
pub struct RuntimeBundle {
    pub store: Arc<dyn ConversationStore>,
    pub states: Arc<dyn ConversationStateStore>,
    pub chat: ChatService,
}

pub fn in_memory_store() -> Arc<dyn ConversationStore> {
    Arc::new(InMemoryConversationStore::new())
}

pub fn in_memory_states() -> Arc<dyn ConversationStateStore> {
    Arc::new(InMemoryStateStore::new())
}

/// A bare engine: no stores, no context providers, no functions.
pub fn chat_service(
    provider: Arc<dyn ModelProvider>,
    agents: impl IntoIterator<Item = Agent>,
) -> Result<ChatService, ChatError> {
    agents
        .into_iter()
        .fold(ChatService::builder().provider_arc(provider), |builder, agent| {
            builder.agent(agent)
        })
        .build()
}

pub fn chat_service_with_memory(
    provider: Arc<dyn ModelProvider>,
    agents: impl IntoIterator<Item = Agent>,
    store: Arc<dyn ConversationStore>,
) -> Result<ChatService, ChatError> {
    agents
        .into_iter()
        .fold(
            ChatService::builder()
                .provider_arc(provider)
                .store(Arc::clone(&store))
                .context_provider(ConversationMemoryProvider::new(store)),
            |builder, agent| builder.agent(agent),
        )
        .build()
}

pub fn build_runtime(
    provider: Arc<dyn ModelProvider>,
    agents: impl IntoIterator<Item = Agent>,
) -> Result<RuntimeBundle, ChatError> {
    build_runtime_with(provider, agents, in_memory_store(), None)
}

pub fn build_runtime_with_memory(
    provider: Arc<dyn ModelProvider>,
    agents: impl IntoIterator<Item = Agent>,
    store: Arc<dyn ConversationStore>,
) -> Result<RuntimeBundle, ChatError> {
    build_runtime_with(provider, agents, store, None)
}

pub fn build_runtime_with_functions(
    provider: Arc<dyn ModelProvider>,
    agents: impl IntoIterator<Item = Agent>,
    functions: FunctionRegistry,
) -> Result<RuntimeBundle, ChatError> {
    build_runtime_with(provider, agents, in_memory_store(), Some(functions))
}

pub fn build_runtime_with(
    provider: Arc<dyn ModelProvider>,
    agents: impl IntoIterator<Item = Agent>,
    store: Arc<dyn ConversationStore>,
    functions: Option<FunctionRegistry>,
) -> Result<RuntimeBundle, ChatError> {
    let mut builder = AgentRuntimeBuilder::new(provider).agents(agents).store(store);

    if let Some(functions) = functions {
        builder = builder.functions(functions);
    }

    builder.build()
}
