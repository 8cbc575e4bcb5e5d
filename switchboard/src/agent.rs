//! Stable, facade-owned builder for a fully wired turn-engine runtime.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    Agent, ChatError, ChatPolicy, ChatService, ContextOrchestrator, ContextProvider,
    ConversationMemoryProvider, ConversationStateStore, ConversationStore,
    DefaultFunctionDispatcher, Function, FunctionRegistry, ModelProvider,
    ResponseTemplateRenderer, RuntimeBundle, SafeDispatchHooks, SafeProviderHooks, SafeTurnHooks,
    TracingObservabilityHooks, in_memory_states, in_memory_store,
};

pub type AgentRuntime = RuntimeBundle;

/// Wires providers, agents, functions, stores and context providers into a
/// [`ChatService`].
///
/// By default the runtime remembers conversations in memory, registers a
/// [`ConversationMemoryProvider`] and reports every hook through panic-safe
/// tracing hooks.
pub struct AgentRuntimeBuilder {
    providers: Vec<Arc<dyn ModelProvider>>,
    agents: Vec<Agent>,
    functions: FunctionRegistry,
    store: Arc<dyn ConversationStore>,
    states: Arc<dyn ConversationStateStore>,
    context_providers: Vec<Arc<dyn ContextProvider>>,
    templates: Option<Arc<dyn ResponseTemplateRenderer>>,
    policy: ChatPolicy,
    dispatch_timeout: Option<Duration>,
    conversation_memory: bool,
    observability: bool,
}

impl AgentRuntimeBuilder {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            providers: vec![provider],
            agents: Vec::new(),
            functions: FunctionRegistry::new(),
            store: in_memory_store(),
            states: in_memory_states(),
            context_providers: Vec::new(),
            templates: None,
            policy: ChatPolicy::default(),
            dispatch_timeout: None,
            conversation_memory: true,
            observability: true,
        }
    }

    pub fn provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn agents(mut self, agents: impl IntoIterator<Item = Agent>) -> Self {
        self.agents.extend(agents);
        self
    }

    pub fn function<F>(mut self, function: F) -> Self
    where
        F: Function + 'static,
    {
        self.functions.register(function);
        self
    }

    pub fn functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    pub fn store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = store;
        self
    }

    pub fn states(mut self, states: Arc<dyn ConversationStateStore>) -> Self {
        self.states = states;
        self
    }

    pub fn context_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.context_providers.push(provider);
        self
    }

    pub fn templates(mut self, templates: Arc<dyn ResponseTemplateRenderer>) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = Some(timeout);
        self
    }

    pub fn without_conversation_memory(mut self) -> Self {
        self.conversation_memory = false;
        self
    }

    pub fn without_observability(mut self) -> Self {
        self.observability = false;
        self
    }

    pub fn build(self) -> Result<AgentRuntime, ChatError> {
        let mut dispatcher = DefaultFunctionDispatcher::new(Arc::new(self.functions));
        if let Some(timeout) = self.dispatch_timeout {
            dispatcher = dispatcher.with_timeout(timeout);
        }

        let mut orchestrator = ContextOrchestrator::builder();
        if self.conversation_memory {
            orchestrator =
                orchestrator.provider(ConversationMemoryProvider::new(Arc::clone(&self.store)));
        }
        orchestrator = orchestrator.providers(self.context_providers);
        if let Some(timeout) = self.policy.context_hook_timeout {
            orchestrator = orchestrator.hook_timeout(timeout);
        }

        let mut chat = ChatService::builder()
            .orchestrator(orchestrator.build())
            .store(Arc::clone(&self.store))
            .states(Arc::clone(&self.states))
            .policy(self.policy);

        if self.observability {
            dispatcher =
                dispatcher.with_hooks(Arc::new(SafeDispatchHooks::new(TracingObservabilityHooks)));
            chat = chat
                .hooks(Arc::new(SafeTurnHooks::new(TracingObservabilityHooks)))
                .provider_hooks(Arc::new(SafeProviderHooks::new(TracingObservabilityHooks)));
        }

        for provider in self.providers {
            chat = chat.provider_arc(provider);
        }
        for agent in self.agents {
            chat = chat.agent(agent);
        }
        if let Some(templates) = self.templates {
            chat = chat.templates(templates);
        }

        let chat = chat.dispatcher(Arc::new(dispatcher)).build()?;

        Ok(RuntimeBundle {
            store: self.store,
            states: self.states,
            chat,
        })
    }
}
