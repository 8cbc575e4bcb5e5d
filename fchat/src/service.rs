//! The turn engine: invoke an agent, dispatch any function it calls, hand off
//! and repeat until a terminal reply is recorded or the depth ceiling is hit.

use std::sync::Arc;

use fcommon::run_bounded;
use fcontext::{ContextOrchestrator, ContextProvider, InvokedContext, InvokingContext};
use fmemory::{ConversationStateStore, ConversationStore};
use fprovider::{
    Agent, BoxedEventStream, FunctionCallSnapshots, Message, ModelProvider, ModelRequest,
    ModelResponse, NoopOperationHooks, ProviderError, ProviderId, ProviderOperationHooks,
    ProviderRegistry, Role, StreamEvent, execute_with_retry,
};
use ftooling::{
    DefaultFunctionDispatcher, DispatchOutcome, FunctionDispatcher, FunctionErrorKind,
    FunctionExecutionContext,
};
use futures_timer::Delay;
use futures_util::StreamExt;

use crate::{
    AgentLoader, ChatError, ChatErrorPhase, ChatEvent, ChatPolicy, InMemoryAgentRegistry,
    InvokeAgentOptions, NoopResponseTemplates, NoopTurnRuntimeHooks, ResponseTemplateRenderer,
    TurnContext, TurnOutcome, TurnRuntimeHooks, normalize_function_name,
};

#[derive(Clone)]
pub struct ChatService {
    providers: Arc<ProviderRegistry>,
    agents: Arc<dyn AgentLoader>,
    dispatcher: Arc<dyn FunctionDispatcher>,
    orchestrator: Arc<ContextOrchestrator>,
    templates: Arc<dyn ResponseTemplateRenderer>,
    store: Option<Arc<dyn ConversationStore>>,
    states: Option<Arc<dyn ConversationStateStore>>,
    hooks: Arc<dyn TurnRuntimeHooks>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
    policy: ChatPolicy,
}

enum Cycle {
    Done(TurnOutcome),
    HandOff(String),
}

impl ChatService {
    pub fn builder() -> ChatServiceBuilder {
        ChatServiceBuilder::default()
    }

    pub fn policy(&self) -> &ChatPolicy {
        &self.policy
    }

    pub fn orchestrator(&self) -> &ContextOrchestrator {
        &self.orchestrator
    }

    /// Drives `agent_id` to a terminal state, appending produced entries to
    /// `dialogs`.
    ///
    /// Returns [`TurnOutcome::Aborted`] when the recursion ceiling is reached;
    /// that is not an error. Cancellation and function-dispatch failures are.
    pub async fn invoke_agent(
        &self,
        agent_id: &str,
        dialogs: &mut Vec<Message>,
        turn: &mut TurnContext,
        options: &InvokeAgentOptions,
    ) -> Result<TurnOutcome, ChatError> {
        turn.push_agent(agent_id);
        let mut next_agent = agent_id.to_string();

        loop {
            match self.run_cycle(&next_agent, dialogs, turn, options).await? {
                Cycle::Done(outcome) => return Ok(outcome),
                Cycle::HandOff(agent_id) => {
                    tracing::debug!(
                        phase = "turn",
                        event = "hand_off",
                        from = %next_agent,
                        to = %agent_id,
                        depth = turn.recursion_depth(),
                    );
                    next_agent = agent_id;
                }
            }
        }
    }

    /// Loads the stored conversation, appends `message` and invokes the agent.
    pub async fn send_message(
        &self,
        agent_id: &str,
        message: Message,
        turn: &mut TurnContext,
        options: &InvokeAgentOptions,
    ) -> Result<TurnOutcome, ChatError> {
        if message.content.trim().is_empty() {
            return Err(ChatError::invalid_request("message content must not be empty"));
        }

        let mut dialogs = match &self.store {
            Some(store) => store.load_dialogs(turn.conversation_id()).await?,
            None => Vec::new(),
        };

        if let Some(store) = &self.store {
            store
                .append_dialogs(turn.conversation_id(), vec![message.clone()])
                .await?;
        }
        dialogs.push(message);

        self.invoke_agent(agent_id, &mut dialogs, turn, options).await
    }

    async fn run_cycle(
        &self,
        agent_id: &str,
        dialogs: &mut Vec<Message>,
        turn: &mut TurnContext,
        options: &InvokeAgentOptions,
    ) -> Result<Cycle, ChatError> {
        if turn.cancel_token().is_cancelled() {
            return Err(ChatError::cancelled(ChatErrorPhase::AgentLoad));
        }

        let agent = self.agents.load_agent(agent_id).await?;
        let (provider, model) = self.resolve_llm(&agent)?;

        let depth = turn.enter_agent();
        let max_depth = agent.llm_config.max_recursion_depth;
        self.hooks
            .on_agent_start(turn.conversation_id(), &agent.id, depth);

        if depth > max_depth {
            tracing::warn!(
                phase = "turn",
                event = "recursion_limit",
                conversation_id = %turn.conversation_id(),
                agent_id = %agent.id,
                depth,
                max_depth,
            );
            self.hooks
                .on_recursion_limit(turn.conversation_id(), &agent.id, depth, max_depth);
            return Ok(Cycle::Done(TurnOutcome::Aborted {
                agent_id: agent.id,
                depth,
                max_depth,
            }));
        }

        let cancel = turn.cancel_token().clone();
        let invoking = InvokingContext::new(&agent, dialogs, turn.conversation_id(), turn.metadata());
        let context = self.orchestrator.run_pre_call(&invoking, &cancel).await;
        if cancel.is_cancelled() {
            return Err(ChatError::cancelled(ChatErrorPhase::PreContext));
        }

        let working = context.apply_to(dialogs);
        let mut request = ModelRequest::for_agent(&agent, model)
            .messages(working.clone())
            .metadata_map(turn.metadata())
            .metadata_map(&context.metadata)
            .streaming(options.use_stream);
        if let Some(instruction) = context.system_instruction.as_deref() {
            request = request.append_instruction(instruction);
        }
        let request = request
            .build()
            .map_err(|error| {
                ChatError::invalid_request(error.message).with_phase(ChatErrorPhase::ModelCall)
            })?;

        turn.count_model_call();
        tracing::debug!(
            phase = "turn",
            event = "model_call",
            agent_id = %agent.id,
            provider = %provider.id(),
            model = %request.model,
            messages = request.messages.len(),
            stream = options.use_stream,
        );

        let reply = match run_bounded(
            self.call_model(provider.as_ref(), request, options),
            &cancel,
            None,
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(error)) => self.model_failure_reply(&agent, turn, &error),
            Err(_) => return Err(ChatError::cancelled(ChatErrorPhase::ModelCall)),
        };
        let reply = link_reply(reply, &agent, dialogs);

        let invoked = InvokedContext::new(
            &agent,
            &working,
            &reply,
            turn.conversation_id(),
            turn.metadata(),
        );
        self.orchestrator.run_post_call(&invoked, &cancel).await;
        if cancel.is_cancelled() {
            return Err(ChatError::cancelled(ChatErrorPhase::PostContext));
        }

        if reply.role == Role::Function {
            return self.run_function(&agent, reply, dialogs, turn).await;
        }

        let mut entry = reply;
        entry.role = Role::Assistant;
        if agent.is_routing() {
            tracing::debug!(
                phase = "turn",
                event = "routing_fallback",
                agent_id = %agent.id,
            );
            entry.content = self.policy.routing_fallback_text.clone();
        }

        self.commit(&agent, entry.clone(), dialogs, turn).await;
        Ok(Cycle::Done(TurnOutcome::Completed { reply: entry }))
    }

    async fn run_function(
        &self,
        agent: &Agent,
        reply: Message,
        dialogs: &mut Vec<Message>,
        turn: &mut TurnContext,
    ) -> Result<Cycle, ChatError> {
        let raw_name = reply.function_name.clone().unwrap_or_default();
        let function_name = normalize_function_name(&raw_name).to_string();

        let mut call = reply;
        call.function_name = Some(function_name.clone());
        call.content.clear();

        self.capture_state(turn, &call).await;

        if turn.cancel_token().is_cancelled() {
            return Err(ChatError::cancelled(ChatErrorPhase::Dispatch));
        }

        tracing::info!(
            phase = "turn",
            event = "function_dispatch",
            conversation_id = %turn.conversation_id(),
            agent_id = %agent.id,
            function = %function_name,
            tool_call_id = call.tool_call_id.as_deref().unwrap_or_default(),
        );
        self.hooks
            .on_function_dispatch(turn.conversation_id(), &agent.id, &function_name);

        let mut context = FunctionExecutionContext::new(turn.conversation_id().clone())
            .with_agent(agent.id.clone())
            .with_cancel(turn.cancel_token().clone());
        context.metadata = turn.metadata().clone();
        if let Some(trace_id) = turn.trace_id() {
            context = context.with_trace_id(trace_id.clone());
        }

        let DispatchOutcome {
            result,
            stop,
            next_agent_id,
        } = match self.dispatcher.dispatch(&function_name, &call, &context).await {
            Ok(outcome) => outcome,
            Err(error) if error.kind == FunctionErrorKind::Cancelled => {
                return Err(ChatError::cancelled(ChatErrorPhase::Dispatch));
            }
            Err(error) => {
                tracing::error!(
                    phase = "turn",
                    event = "dispatch_failed",
                    agent_id = %agent.id,
                    function = %function_name,
                    error = %error,
                );
                return Err(error.into());
            }
        };

        if let Some(next_agent_id) = next_agent_id {
            turn.push_agent(next_agent_id);
        }

        if stop {
            let entry = result.derive(Role::Assistant, result.content.clone());
            self.commit(agent, entry.clone(), dialogs, turn).await;
            return Ok(Cycle::Done(TurnOutcome::Completed { reply: entry }));
        }

        if let Some(text) = self
            .templates
            .render(&agent.id, &result)
            .filter(|text| !text.trim().is_empty())
        {
            let entry = result.derive(Role::Assistant, text);
            self.commit(agent, entry.clone(), dialogs, turn).await;
            return Ok(Cycle::Done(TurnOutcome::Completed { reply: entry }));
        }

        self.commit(agent, result, dialogs, turn).await;
        let next_agent = turn
            .current_agent_id()
            .unwrap_or(agent.id.as_str())
            .to_string();
        Ok(Cycle::HandOff(next_agent))
    }

    fn resolve_llm(&self, agent: &Agent) -> Result<(Arc<dyn ModelProvider>, String), ChatError> {
        let config = &agent.llm_config;
        let (provider, model) = match (non_blank(&config.provider), non_blank(&config.model)) {
            (Some(provider), Some(model)) => (provider, model),
            _ => (
                non_blank(&self.policy.default_llm.provider).ok_or_else(|| {
                    ChatError::invalid_request(format!(
                        "agent '{}' has no provider and no default is configured",
                        agent.id
                    ))
                })?,
                non_blank(&self.policy.default_llm.model).ok_or_else(|| {
                    ChatError::invalid_request(format!(
                        "agent '{}' has no model and no default is configured",
                        agent.id
                    ))
                })?,
            ),
        };

        let provider_id = ProviderId::from(provider);
        let provider = self.providers.get(&provider_id).ok_or_else(|| {
            ChatError::invalid_request(format!("provider '{provider_id}' is not registered"))
                .with_phase(ChatErrorPhase::ModelCall)
        })?;

        Ok((provider, model.to_string()))
    }

    async fn call_model(
        &self,
        provider: &dyn ModelProvider,
        request: ModelRequest,
        options: &InvokeAgentOptions,
    ) -> Result<Message, ProviderError> {
        let provider_id = provider.id();
        let operation = if options.use_stream { "stream" } else { "complete" };

        execute_with_retry(
            &provider_id,
            operation,
            &self.policy.retry_policy,
            self.provider_hooks.as_ref(),
            |_attempt| {
                let request = request.clone();
                async move {
                    if options.use_stream {
                        match provider.stream(request).await {
                            Ok(stream) => fold_stream(stream, options).await,
                            Err(error) => Err(error),
                        }
                    } else {
                        provider.complete(request).await.map(ModelResponse::into_reply)
                    }
                }
            },
            Delay::new,
        )
        .await
    }

    fn model_failure_reply(
        &self,
        agent: &Agent,
        turn: &TurnContext,
        error: &ProviderError,
    ) -> Message {
        tracing::error!(
            phase = "turn",
            event = "model_failed",
            conversation_id = %turn.conversation_id(),
            agent_id = %agent.id,
            kind = ?error.kind,
            error = %error,
        );
        self.hooks
            .on_model_failure(turn.conversation_id(), &agent.id, error);

        let text = if error.is_content_filtered() {
            &self.policy.content_filter_text
        } else {
            &self.policy.model_failure_text
        };
        Message::new(Role::Assistant, text.clone())
    }

    async fn capture_state(&self, turn: &TurnContext, call: &Message) {
        let (Some(states), Some(args)) = (&self.states, call.function_args.as_deref()) else {
            return;
        };

        match states.save_state_by_args(turn.conversation_id(), args).await {
            Ok(saved) => tracing::debug!(
                phase = "turn",
                event = "state_captured",
                conversation_id = %turn.conversation_id(),
                entries = saved,
            ),
            Err(error) if error.is_invalid_request() => tracing::debug!(
                phase = "turn",
                event = "state_args_ignored",
                conversation_id = %turn.conversation_id(),
                error = %error,
            ),
            Err(error) => tracing::warn!(
                phase = "turn",
                event = "state_capture_failed",
                conversation_id = %turn.conversation_id(),
                error = %error,
            ),
        }
    }

    async fn commit(
        &self,
        agent: &Agent,
        entry: Message,
        dialogs: &mut Vec<Message>,
        turn: &mut TurnContext,
    ) {
        if let Some(store) = &self.store
            && let Err(error) = store
                .append_dialogs(turn.conversation_id(), vec![entry.clone()])
                .await
        {
            tracing::warn!(
                phase = "turn",
                event = "store_append_failed",
                conversation_id = %turn.conversation_id(),
                error = %error,
            );
        }

        self.hooks
            .on_reply_committed(turn.conversation_id(), &agent.id, &entry);
        dialogs.push(entry.clone());
        turn.record(entry);
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.trim().is_empty())
}

/// Stamps agent and reply linkage onto a model reply.
fn link_reply(mut reply: Message, agent: &Agent, dialogs: &[Message]) -> Message {
    reply.current_agent_id = Some(agent.id.clone());
    if reply.message_id.is_none() {
        reply.message_id = dialogs.last().and_then(|last| last.message_id.clone());
    }
    reply
}

/// Folds a provider stream into one reply entry, forwarding deltas to the
/// caller's observer. The first call id seen wins, with its final snapshot.
async fn fold_stream(
    mut stream: BoxedEventStream<'_>,
    options: &InvokeAgentOptions,
) -> Result<Message, ProviderError> {
    let mut text = String::new();
    let mut calls = FunctionCallSnapshots::default();
    let mut response: Option<ModelResponse> = None;

    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::TextDelta(delta) => {
                text.push_str(&delta);
                options.notify(ChatEvent::TextDelta(delta));
            }
            StreamEvent::FunctionCallDelta(delta) => {
                options.notify(ChatEvent::FunctionCallDelta(delta.clone()));
                calls.record(delta);
            }
            StreamEvent::MessageComplete(message) => {
                if message.role == Role::Assistant && text.is_empty() {
                    text = message.content;
                }
            }
            StreamEvent::ResponseComplete(complete) => response = Some(complete),
        }
    }

    let mut reply = response
        .map(ModelResponse::into_reply)
        .unwrap_or_else(|| Message::new(Role::Assistant, String::new()));

    if reply.role != Role::Function {
        if let Some(call) = calls.first() {
            reply = Message::new(Role::Function, text).with_function_call(call);
        } else if reply.content.is_empty() {
            reply.content = text;
        }
    }

    let reply = reply.streaming(true);
    options.notify(ChatEvent::ReplyComplete(reply.clone()));
    Ok(reply)
}

#[derive(Default)]
pub struct ChatServiceBuilder {
    providers: ProviderRegistry,
    agents: Option<Arc<dyn AgentLoader>>,
    agent_registry: InMemoryAgentRegistry,
    dispatcher: Option<Arc<dyn FunctionDispatcher>>,
    orchestrator: Option<ContextOrchestrator>,
    context_providers: Vec<Arc<dyn ContextProvider>>,
    templates: Option<Arc<dyn ResponseTemplateRenderer>>,
    store: Option<Arc<dyn ConversationStore>>,
    states: Option<Arc<dyn ConversationStateStore>>,
    hooks: Option<Arc<dyn TurnRuntimeHooks>>,
    provider_hooks: Option<Arc<dyn ProviderOperationHooks>>,
    policy: ChatPolicy,
}

impl ChatServiceBuilder {
    pub fn provider<P>(mut self, provider: P) -> Self
    where
        P: ModelProvider + 'static,
    {
        self.providers.register(provider);
        self
    }

    pub fn provider_arc(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.providers.register_arc(provider);
        self
    }

    pub fn providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    /// Registers an agent in the built-in registry. Ignored when a custom loader is set.
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agent_registry.register(agent);
        self
    }

    pub fn agent_loader(mut self, agents: Arc<dyn AgentLoader>) -> Self {
        self.agents = Some(agents);
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn FunctionDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn orchestrator(mut self, orchestrator: ContextOrchestrator) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    /// Adds a provider to the orchestrator built from the policy. Ignored when a
    /// prebuilt orchestrator is set.
    pub fn context_provider<P>(mut self, provider: P) -> Self
    where
        P: ContextProvider + 'static,
    {
        self.context_providers.push(Arc::new(provider));
        self
    }

    pub fn templates(mut self, templates: Arc<dyn ResponseTemplateRenderer>) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn states(mut self, states: Arc<dyn ConversationStateStore>) -> Self {
        self.states = Some(states);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn TurnRuntimeHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn provider_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.provider_hooks = Some(hooks);
        self
    }

    pub fn policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<ChatService, ChatError> {
        self.policy.validate()?;

        if self.providers.is_empty() {
            return Err(ChatError::invalid_request(
                "at least one model provider is required",
            ));
        }

        let orchestrator = match self.orchestrator {
            Some(orchestrator) => orchestrator,
            None => {
                let mut builder = ContextOrchestrator::builder().providers(self.context_providers);
                if let Some(timeout) = self.policy.context_hook_timeout {
                    builder = builder.hook_timeout(timeout);
                }
                builder.build()
            }
        };

        let agents = match self.agents {
            Some(agents) => agents,
            None => Arc::new(self.agent_registry),
        };

        Ok(ChatService {
            providers: Arc::new(self.providers),
            agents,
            dispatcher: self
                .dispatcher
                .unwrap_or_else(|| Arc::new(DefaultFunctionDispatcher::default())),
            orchestrator: Arc::new(orchestrator),
            templates: self
                .templates
                .unwrap_or_else(|| Arc::new(NoopResponseTemplates)),
            store: self.store,
            states: self.states,
            hooks: self.hooks.unwrap_or_else(|| Arc::new(NoopTurnRuntimeHooks)),
            provider_hooks: self
                .provider_hooks
                .unwrap_or_else(|| Arc::new(NoopOperationHooks)),
            policy: self.policy,
        })
    }
}
