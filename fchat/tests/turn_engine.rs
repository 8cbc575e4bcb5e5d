use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use fchat::prelude::*;
use fchat::{CONTENT_FILTER_TEXT, MODEL_FAILURE_TEXT, ROUTING_FALLBACK_TEXT};
use fcommon::BoxFuture;
use fcontext::{
    AiContext, CONVERSATION_HISTORY_INSTRUCTION, ContextError, ContextProvider,
    ConversationMemoryProvider, InvokingContext,
};
use fmemory::{
    ConversationStateStore, ConversationStore, InMemoryConversationStore, InMemoryStateStore,
};
use fprovider::{
    Agent, AgentType, BoxedEventStream, FunctionCall, FunctionDefinition, LlmConfig, Message,
    ModelProvider, ModelRequest, ModelResponse, OutputItem, ProviderError, ProviderFuture,
    ProviderId, Role, StopReason, StreamEvent, TokenUsage, VecEventStream,
};
use ftooling::{DefaultFunctionDispatcher, FunctionOutput, FunctionRegistry};

const PROVIDER: &str = "scripted";

/// Returns queued replies in order, then repeats `fallback` once the queue drains.
struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<ModelResponse, ProviderError>>>,
    fallback: Option<ModelResponse>,
    streams: Mutex<VecDeque<Vec<Result<StreamEvent, ProviderError>>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<ModelResponse, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: None,
            streams: Mutex::new(VecDeque::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn repeating(response: ModelResponse) -> Self {
        let mut provider = Self::new(Vec::new());
        provider.fallback = Some(response);
        provider
    }

    fn with_stream(self, events: Vec<Result<StreamEvent, ProviderError>>) -> Self {
        self.streams.lock().expect("streams lock").push_back(events);
        self
    }

    fn requests(&self) -> Arc<Mutex<Vec<ModelRequest>>> {
        Arc::clone(&self.requests)
    }

    fn next_reply(&self, request: ModelRequest) -> Result<ModelResponse, ProviderError> {
        self.requests.lock().expect("requests lock").push(request);
        match self.replies.lock().expect("replies lock").pop_front() {
            Some(reply) => reply,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ProviderError::other("script exhausted")),
        }
    }
}

impl ModelProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::from(PROVIDER)
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move { self.next_reply(request) })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            self.requests.lock().expect("requests lock").push(request);
            let events = self.streams.lock().expect("streams lock").pop_front();
            match events {
                Some(events) => {
                    let stream: BoxedEventStream<'a> = Box::pin(VecEventStream::new(events));
                    Ok(stream)
                }
                None => Err(ProviderError::other("stream script exhausted")),
            }
        })
    }
}

struct InjectingProvider {
    cancel: Option<CancellationToken>,
}

impl ContextProvider for InjectingProvider {
    fn name(&self) -> &str {
        "injecting"
    }

    fn on_invoking<'a>(
        &'a self,
        _context: &'a InvokingContext<'a>,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<AiContext>, ContextError>> {
        Box::pin(async move {
            if let Some(cancel) = &self.cancel {
                cancel.cancel();
            }
            Ok(Some(
                AiContext::new()
                    .with_message(Message::new(Role::System, "injected"))
                    .with_instruction("Answer briefly.")
                    .with_metadata("tenant", "acme"),
            ))
        })
    }
}

#[derive(Default)]
struct RecordingHooks {
    events: Mutex<Vec<String>>,
}

impl TurnRuntimeHooks for RecordingHooks {
    fn on_agent_start(&self, _conversation_id: &ConversationId, agent_id: &str, depth: u32) {
        self.push(format!("start:{agent_id}:{depth}"));
    }

    fn on_recursion_limit(
        &self,
        _conversation_id: &ConversationId,
        agent_id: &str,
        depth: u32,
        max_depth: u32,
    ) {
        self.push(format!("limit:{agent_id}:{depth}/{max_depth}"));
    }

    fn on_model_failure(
        &self,
        _conversation_id: &ConversationId,
        agent_id: &str,
        _error: &ProviderError,
    ) {
        self.push(format!("model_failure:{agent_id}"));
    }

    fn on_function_dispatch(
        &self,
        _conversation_id: &ConversationId,
        _agent_id: &str,
        function_name: &str,
    ) {
        self.push(format!("dispatch:{function_name}"));
    }

    fn on_reply_committed(
        &self,
        _conversation_id: &ConversationId,
        _agent_id: &str,
        entry: &Message,
    ) {
        self.push(format!("commit:{}", entry.role));
    }
}

impl RecordingHooks {
    fn push(&self, event: String) {
        self.events.lock().expect("events lock").push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }
}

fn text_response(text: &str) -> ModelResponse {
    ModelResponse {
        provider: ProviderId::from(PROVIDER),
        model: "model-x".to_string(),
        output: vec![OutputItem::Message(Message::new(Role::Assistant, text))],
        stop_reason: StopReason::EndTurn,
        usage: TokenUsage::default(),
    }
}

fn call_response(name: &str, arguments: &str) -> ModelResponse {
    ModelResponse {
        provider: ProviderId::from(PROVIDER),
        model: "model-x".to_string(),
        output: vec![OutputItem::FunctionCall(FunctionCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        })],
        stop_reason: StopReason::FunctionCall,
        usage: TokenUsage::default(),
    }
}

fn definition(name: &str) -> FunctionDefinition {
    FunctionDefinition {
        name: name.to_string(),
        description: format!("{name} function"),
        input_schema: "{\"type\":\"object\"}".to_string(),
    }
}

fn task_agent(id: &str) -> Agent {
    Agent::new(id, id)
        .with_llm_config(LlmConfig::new(PROVIDER, "model-x"))
        .with_function(definition("lookup"))
}

fn dispatcher_with(register: impl FnOnce(&mut FunctionRegistry)) -> Arc<DefaultFunctionDispatcher> {
    let mut registry = FunctionRegistry::new();
    register(&mut registry);
    Arc::new(DefaultFunctionDispatcher::new(Arc::new(registry)))
}

fn lookup_dispatcher() -> Arc<DefaultFunctionDispatcher> {
    dispatcher_with(|registry| {
        registry.register_sync_fn(definition("lookup"), |_args, _context| {
            Ok(FunctionOutput::new("sunny"))
        });
    })
}

fn user_dialogs() -> Vec<Message> {
    vec![Message::new(Role::User, "hi").with_message_id("m-1")]
}

#[tokio::test]
async fn function_call_result_is_fed_back_for_a_second_model_call() {
    let provider = ScriptedProvider::new(vec![
        Ok(call_response("lookup", "{\"q\":\"weather\"}")),
        Ok(text_response("It is sunny today.")),
    ]);
    let requests = provider.requests();
    let service = ChatService::builder()
        .provider(provider)
        .agent(task_agent("agent-a"))
        .dispatcher(lookup_dispatcher())
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    let outcome = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect("turn should complete");

    assert_eq!(turn.model_calls(), 2);
    assert_eq!(turn.recursion_depth(), 2);
    assert_eq!(dialogs.len(), 3);

    let function_entry = &dialogs[1];
    assert_eq!(function_entry.role, Role::Function);
    assert_eq!(function_entry.content, "sunny");
    assert_eq!(function_entry.function_name.as_deref(), Some("lookup"));
    assert_eq!(function_entry.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(function_entry.message_id.as_deref(), Some("m-1"));

    let reply = outcome.reply().expect("completed reply");
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "It is sunny today.");
    assert_eq!(reply.current_agent_id.as_deref(), Some("agent-a"));
    assert_eq!(dialogs[2], reply.clone());
    assert_eq!(turn.dialogs().len(), 2);

    let requests = requests.lock().expect("requests lock");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].functions.len(), 1);
    assert!(
        requests[1]
            .messages
            .iter()
            .any(|message| message.role == Role::Function && message.content == "sunny")
    );
}

#[tokio::test]
async fn recursion_ceiling_aborts_before_another_model_call() {
    let provider =
        ScriptedProvider::repeating(call_response("lookup", "{\"q\":\"weather\"}"));
    let requests = provider.requests();
    let hooks = Arc::new(RecordingHooks::default());
    let agent = Agent::new("agent-a", "Looper")
        .with_llm_config(LlmConfig::new(PROVIDER, "model-x").with_max_recursion_depth(2));
    let service = ChatService::builder()
        .provider(provider)
        .agent(agent)
        .dispatcher(lookup_dispatcher())
        .hooks(hooks.clone())
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    let outcome = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect("abort is not an error");

    assert_eq!(
        outcome,
        TurnOutcome::Aborted {
            agent_id: "agent-a".to_string(),
            depth: 3,
            max_depth: 2,
        }
    );
    assert_eq!(turn.model_calls(), 2);
    assert_eq!(requests.lock().expect("requests lock").len(), 2);
    assert_eq!(dialogs.len(), 3);
    assert!(dialogs[1..].iter().all(|entry| entry.role == Role::Function));
    assert!(hooks.events().contains(&"limit:agent-a:3/2".to_string()));
}

#[tokio::test]
async fn routing_agent_reply_is_replaced_with_fallback_text() {
    let agent = Agent::new("router", "Router")
        .with_type(AgentType::Routing)
        .with_llm_config(LlmConfig::new(PROVIDER, "model-x"));
    let service = ChatService::builder()
        .provider(ScriptedProvider::new(vec![Ok(text_response(
            "Let me think about who should answer.",
        ))]))
        .agent(agent)
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    let outcome = service
        .invoke_agent("router", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect("turn should complete");

    let reply = outcome.reply().expect("completed reply");
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, ROUTING_FALLBACK_TEXT);
    assert_eq!(dialogs.last(), Some(reply));
}

#[tokio::test]
async fn qualified_function_names_are_normalized_before_dispatch() {
    let hooks = Arc::new(RecordingHooks::default());
    let dispatcher = dispatcher_with(|registry| {
        registry.register_sync_fn(definition("real_function"), |args, _context| {
            Ok(FunctionOutput::new(format!("ran with {args}")))
        });
    });
    let service = ChatService::builder()
        .provider(ScriptedProvider::new(vec![
            Ok(call_response("AgentX/real_function", "{\"id\":7}")),
            Ok(text_response("done")),
        ]))
        .agent(task_agent("agent-a"))
        .dispatcher(dispatcher)
        .hooks(hooks.clone())
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect("turn should complete");

    assert_eq!(dialogs[1].function_name.as_deref(), Some("real_function"));
    assert_eq!(dialogs[1].content, "ran with {\"id\":7}");
    assert!(hooks.events().contains(&"dispatch:real_function".to_string()));
}

#[tokio::test]
async fn stop_completion_commits_function_output_without_recursing() {
    let dispatcher = dispatcher_with(|registry| {
        registry.register_sync_fn(definition("lookup"), |_args, _context| {
            Ok(FunctionOutput::stop("Your order has shipped."))
        });
    });
    let service = ChatService::builder()
        .provider(ScriptedProvider::new(vec![Ok(call_response(
            "lookup",
            "{\"order\":\"A1\"}",
        ))]))
        .agent(task_agent("agent-a"))
        .dispatcher(dispatcher)
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    let outcome = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect("turn should complete");

    let reply = outcome.reply().expect("completed reply");
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "Your order has shipped.");
    assert_eq!(turn.model_calls(), 1);
    assert_eq!(dialogs.len(), 2);
}

#[tokio::test]
async fn matching_template_renders_the_reply() {
    let dispatcher = dispatcher_with(|registry| {
        registry.register_sync_fn(definition("book_table"), |_args, _context| {
            Ok(FunctionOutput::new("confirmed"))
        });
    });
    let templates = StaticResponseTemplates::new().with_template(
        "agent-a",
        "book_table",
        "Table for {{guests}} is {{content}}.",
    );
    let service = ChatService::builder()
        .provider(ScriptedProvider::new(vec![Ok(call_response(
            "book_table",
            "{\"guests\":4}",
        ))]))
        .agent(task_agent("agent-a"))
        .dispatcher(dispatcher)
        .templates(Arc::new(templates))
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    let outcome = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect("turn should complete");

    assert_eq!(
        outcome.reply().map(|reply| reply.content.as_str()),
        Some("Table for 4 is confirmed.")
    );
    assert_eq!(turn.model_calls(), 1);
}

#[tokio::test]
async fn function_can_hand_off_to_another_agent() {
    let dispatcher = dispatcher_with(|registry| {
        registry.register_sync_fn(definition("lookup"), |_args, _context| {
            Ok(FunctionOutput::new("transferring").with_next_agent("agent-b"))
        });
    });
    let service = ChatService::builder()
        .provider(ScriptedProvider::new(vec![
            Ok(call_response("lookup", "{}")),
            Ok(text_response("Billing here, how can I help?")),
        ]))
        .agent(task_agent("agent-a"))
        .agent(task_agent("agent-b"))
        .dispatcher(dispatcher)
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    let outcome = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect("turn should complete");

    assert_eq!(turn.agent_stack(), ["agent-a", "agent-b"]);
    let reply = outcome.reply().expect("completed reply");
    assert_eq!(reply.current_agent_id.as_deref(), Some("agent-b"));
    assert_eq!(reply.content, "Billing here, how can I help?");
}

#[tokio::test]
async fn model_failures_become_assistant_replies() {
    let hooks = Arc::new(RecordingHooks::default());
    let service = ChatService::builder()
        .provider(ScriptedProvider::new(vec![
            Err(ProviderError::transport("connection reset")),
            Err(ProviderError::content_filtered("blocked")),
        ]))
        .agent(task_agent("agent-a"))
        .hooks(hooks.clone())
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    let outcome = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect("failure reply is not an error");
    assert_eq!(
        outcome.reply().map(|reply| reply.content.as_str()),
        Some(MODEL_FAILURE_TEXT)
    );

    let mut turn = TurnContext::new("conv-1");
    let outcome = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect("failure reply is not an error");
    assert_eq!(
        outcome.reply().map(|reply| reply.content.as_str()),
        Some(CONTENT_FILTER_TEXT)
    );

    let failures = hooks
        .events()
        .into_iter()
        .filter(|event| event.starts_with("model_failure"))
        .count();
    assert_eq!(failures, 2);
}

#[tokio::test]
async fn streaming_forwards_deltas_to_the_observer() {
    let provider = ScriptedProvider::new(Vec::new()).with_stream(vec![
        Ok(StreamEvent::TextDelta("Hel".to_string())),
        Ok(StreamEvent::TextDelta("lo".to_string())),
        Ok(StreamEvent::ResponseComplete(text_response("Hello"))),
    ]);
    let requests = provider.requests();
    let service = ChatService::builder()
        .provider(provider)
        .agent(task_agent("agent-a"))
        .build()
        .expect("service should build");

    let seen = Arc::new(Mutex::new(Vec::<ChatEvent>::new()));
    let sink = Arc::clone(&seen);
    let observer: ChatEventObserver = Arc::new(move |event: ChatEvent| {
        sink.lock().expect("events lock").push(event);
    });
    let options = InvokeAgentOptions::streaming().with_observer(observer);

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    let outcome = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &options)
        .await
        .expect("turn should complete");

    let reply = outcome.reply().expect("completed reply");
    assert_eq!(reply.content, "Hello");
    assert!(reply.is_streaming);
    assert!(requests.lock().expect("requests lock")[0].options.stream);

    let seen = seen.lock().expect("events lock");
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0], ChatEvent::TextDelta("Hel".to_string()));
    assert_eq!(seen[1], ChatEvent::TextDelta("lo".to_string()));
    assert!(matches!(&seen[2], ChatEvent::ReplyComplete(reply) if reply.content == "Hello"));
}

#[tokio::test]
async fn streamed_function_call_is_dispatched() {
    let provider = ScriptedProvider::new(Vec::new())
        .with_stream(vec![Ok(StreamEvent::FunctionCallDelta(FunctionCall {
            id: "call_9".to_string(),
            name: "lookup".to_string(),
            arguments: "{}".to_string(),
        }))])
        .with_stream(vec![Ok(StreamEvent::TextDelta("All clear.".to_string()))]);
    let service = ChatService::builder()
        .provider(provider)
        .agent(task_agent("agent-a"))
        .dispatcher(lookup_dispatcher())
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    let outcome = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::streaming())
        .await
        .expect("turn should complete");

    assert_eq!(dialogs[1].tool_call_id.as_deref(), Some("call_9"));
    assert_eq!(dialogs[1].content, "sunny");
    assert_eq!(
        outcome.reply().map(|reply| reply.content.as_str()),
        Some("All clear.")
    );
}

#[tokio::test]
async fn streamed_call_snapshots_dispatch_the_complete_arguments() {
    let snapshot = |name: &str, arguments: &str| {
        Ok(StreamEvent::FunctionCallDelta(FunctionCall {
            id: "call_4".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }))
    };
    let states = Arc::new(InMemoryStateStore::new());
    let provider = ScriptedProvider::new(Vec::new())
        .with_stream(vec![
            snapshot("", "{\"city\":"),
            snapshot("lookup", "{\"city\":\"Oslo\"}"),
        ])
        .with_stream(vec![Ok(StreamEvent::TextDelta("Cold.".to_string()))]);
    let service = ChatService::builder()
        .provider(provider)
        .agent(task_agent("agent-a"))
        .dispatcher(lookup_dispatcher())
        .states(states.clone())
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-4");
    service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::streaming())
        .await
        .expect("turn should complete");

    assert_eq!(dialogs[1].tool_call_id.as_deref(), Some("call_4"));
    assert_eq!(dialogs[1].function_name.as_deref(), Some("lookup"));
    assert_eq!(dialogs[1].content, "sunny");
    let saved = states
        .load_states(&ConversationId::from("conv-4"))
        .await
        .expect("states should load");
    assert_eq!(saved.get("city").map(String::as_str), Some("Oslo"));
}

#[tokio::test]
async fn failed_stream_reply_is_not_marked_streaming() {
    let provider = ScriptedProvider::new(Vec::new()).with_stream(vec![
        Ok(StreamEvent::TextDelta("par".to_string())),
        Err(ProviderError::transport("dropped")),
    ]);
    let service = ChatService::builder()
        .provider(provider)
        .agent(task_agent("agent-a"))
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    let outcome = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::streaming())
        .await
        .expect("failure reply is not an error");

    let reply = outcome.reply().expect("fallback reply");
    assert_eq!(reply.content, MODEL_FAILURE_TEXT);
    assert!(!reply.is_streaming);
    assert!(!dialogs[1].is_streaming);
}

#[tokio::test]
async fn cancelled_turn_appends_nothing() {
    let provider = ScriptedProvider::new(vec![Ok(text_response("never"))]);
    let requests = provider.requests();
    let service = ChatService::builder()
        .provider(provider)
        .agent(task_agent("agent-a"))
        .build()
        .expect("service should build");

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1").with_cancel(cancel);
    let error = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect_err("cancelled turn should fail");

    assert!(error.is_cancelled());
    assert_eq!(dialogs.len(), 1);
    assert!(requests.lock().expect("requests lock").is_empty());
}

#[tokio::test]
async fn cancellation_during_pre_call_skips_the_model() {
    let provider = ScriptedProvider::new(vec![Ok(text_response("never"))]);
    let requests = provider.requests();
    let cancel = CancellationToken::new();
    let service = ChatService::builder()
        .provider(provider)
        .agent(task_agent("agent-a"))
        .context_provider(InjectingProvider {
            cancel: Some(cancel.clone()),
        })
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1").with_cancel(cancel);
    let error = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect_err("cancelled turn should fail");

    assert_eq!(error.kind, ChatErrorKind::Cancelled);
    assert_eq!(error.phase, Some(ChatErrorPhase::PreContext));
    assert_eq!(turn.model_calls(), 0);
    assert!(requests.lock().expect("requests lock").is_empty());
}

#[tokio::test]
async fn function_arguments_are_captured_as_conversation_state() {
    let states = Arc::new(InMemoryStateStore::new());
    let service = ChatService::builder()
        .provider(ScriptedProvider::new(vec![
            Ok(call_response("lookup", "{\"city\":\"Oslo\",\"days\":3,\"unit\":null}")),
            Ok(text_response("Cold.")),
        ]))
        .agent(task_agent("agent-a"))
        .dispatcher(lookup_dispatcher())
        .states(states.clone())
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-7");
    service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect("turn should complete");

    let saved = states
        .load_states(&ConversationId::from("conv-7"))
        .await
        .expect("states should load");
    assert_eq!(saved.get("city").map(String::as_str), Some("Oslo"));
    assert_eq!(saved.get("days").map(String::as_str), Some("3"));
    assert!(!saved.contains_key("unit"));
}

#[tokio::test]
async fn invalid_function_arguments_do_not_fail_the_turn() {
    let states = Arc::new(InMemoryStateStore::new());
    let service = ChatService::builder()
        .provider(ScriptedProvider::new(vec![
            Ok(call_response("lookup", "not json")),
            Ok(text_response("Still fine.")),
        ]))
        .agent(task_agent("agent-a"))
        .dispatcher(lookup_dispatcher())
        .states(states.clone())
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    let outcome = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect("turn should complete");

    assert!(outcome.is_completed());
    let saved = states
        .load_states(&ConversationId::from("conv-1"))
        .await
        .expect("states should load");
    assert!(saved.is_empty());
}

#[tokio::test]
async fn injected_context_reaches_the_model_but_is_not_persisted() {
    let store = Arc::new(InMemoryConversationStore::new());
    let provider = ScriptedProvider::new(vec![Ok(text_response("Hello there."))]);
    let requests = provider.requests();
    let service = ChatService::builder()
        .provider(provider)
        .agent(task_agent("agent-a").with_instruction("You are helpful."))
        .context_provider(InjectingProvider { cancel: None })
        .store(store.clone())
        .build()
        .expect("service should build");

    let mut turn = TurnContext::new("conv-1");
    service
        .send_message(
            "agent-a",
            Message::new(Role::User, "hi"),
            &mut turn,
            &InvokeAgentOptions::default(),
        )
        .await
        .expect("turn should complete");

    let requests = requests.lock().expect("requests lock");
    let request = &requests[0];
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].content, "injected");
    assert_eq!(request.messages[1].content, "hi");
    assert_eq!(
        request.system_instruction.as_deref(),
        Some("You are helpful.\nAnswer briefly.")
    );
    assert_eq!(request.metadata.get("tenant").map(String::as_str), Some("acme"));

    let stored = store
        .load_dialogs(&ConversationId::from("conv-1"))
        .await
        .expect("dialogs should load");
    let contents = stored
        .iter()
        .map(|entry| entry.content.as_str())
        .collect::<Vec<_>>();
    assert_eq!(contents, vec!["hi", "Hello there."]);
}

#[tokio::test]
async fn conversation_memory_adds_history_instruction_on_follow_up() {
    let store = Arc::new(InMemoryConversationStore::new());
    let provider = ScriptedProvider::new(vec![
        Ok(text_response("First answer.")),
        Ok(text_response("Second answer.")),
    ]);
    let requests = provider.requests();
    let service = ChatService::builder()
        .provider(provider)
        .agent(task_agent("agent-a"))
        .context_provider(ConversationMemoryProvider::new(store.clone()))
        .store(store.clone())
        .build()
        .expect("service should build");

    for text in ["first", "second"] {
        let mut turn = TurnContext::new("conv-1");
        service
            .send_message(
                "agent-a",
                Message::new(Role::User, text),
                &mut turn,
                &InvokeAgentOptions::default(),
            )
            .await
            .expect("turn should complete");
    }

    let requests = requests.lock().expect("requests lock");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].messages.len(), 3);
    assert!(
        requests[1]
            .system_instruction
            .as_deref()
            .is_some_and(|instruction| instruction.contains(CONVERSATION_HISTORY_INSTRUCTION))
    );
}

#[tokio::test]
async fn agents_without_llm_config_use_the_policy_default() {
    let provider = ScriptedProvider::new(vec![Ok(text_response("ok"))]);
    let requests = provider.requests();
    let service = ChatService::builder()
        .provider(provider)
        .agent(Agent::new("agent-a", "Plain"))
        .policy(ChatPolicy::default().with_default_llm(PROVIDER, "fallback-model"))
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect("turn should complete");

    assert_eq!(requests.lock().expect("requests lock")[0].model, "fallback-model");
}

#[tokio::test]
async fn unresolvable_agents_and_providers_are_errors() {
    let service = ChatService::builder()
        .provider(ScriptedProvider::new(Vec::new()))
        .agent(
            Agent::new("agent-a", "Elsewhere")
                .with_llm_config(LlmConfig::new("absent", "model-x")),
        )
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    let error = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect_err("unknown provider should fail");
    assert_eq!(error.kind, ChatErrorKind::InvalidRequest);

    let mut turn = TurnContext::new("conv-1");
    let error = service
        .invoke_agent("ghost", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect_err("unknown agent should fail");
    assert_eq!(error.kind, ChatErrorKind::AgentNotFound);
    assert_eq!(dialogs.len(), 1);
}

#[tokio::test]
async fn unknown_function_fails_the_turn() {
    let service = ChatService::builder()
        .provider(ScriptedProvider::new(vec![Ok(call_response("missing", "{}"))]))
        .agent(task_agent("agent-a"))
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    let error = service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect_err("dispatch should fail");

    assert_eq!(error.kind, ChatErrorKind::Dispatch);
    assert_eq!(dialogs.len(), 1);
}

#[tokio::test]
async fn hooks_observe_the_turn_in_order() {
    let hooks = Arc::new(RecordingHooks::default());
    let service = ChatService::builder()
        .provider(ScriptedProvider::new(vec![
            Ok(call_response("lookup", "{}")),
            Ok(text_response("done")),
        ]))
        .agent(task_agent("agent-a"))
        .dispatcher(lookup_dispatcher())
        .hooks(hooks.clone())
        .build()
        .expect("service should build");

    let mut dialogs = user_dialogs();
    let mut turn = TurnContext::new("conv-1");
    service
        .invoke_agent("agent-a", &mut dialogs, &mut turn, &InvokeAgentOptions::default())
        .await
        .expect("turn should complete");

    assert_eq!(
        hooks.events(),
        vec![
            "start:agent-a:1",
            "dispatch:lookup",
            "commit:function",
            "start:agent-a:2",
            "commit:assistant",
        ]
    );
}

#[test]
fn builder_requires_a_model_provider() {
    let error = ChatService::builder()
        .agent(task_agent("agent-a"))
        .build()
        .err()
        .expect("build should fail");

    assert_eq!(error.kind, ChatErrorKind::InvalidRequest);
}
