//! Per-turn execution state, caller options and turn outcomes.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use fcommon::{CancellationToken, ConversationId, MetadataMap, TraceId};
use fprovider::{FunctionCall, Message};

/// State owned by one external call to the engine and threaded through every
/// agent hand-off it causes. Never shared between turns.
#[derive(Debug, Clone)]
pub struct TurnContext {
    conversation_id: ConversationId,
    trace_id: Option<TraceId>,
    metadata: MetadataMap,
    cancel: CancellationToken,
    recursion_depth: u32,
    model_calls: u32,
    agent_stack: Vec<String>,
    dialogs: Vec<Message>,
}

impl TurnContext {
    pub fn new(conversation_id: impl Into<ConversationId>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            trace_id: None,
            metadata: MetadataMap::new(),
            cancel: CancellationToken::new(),
            recursion_depth: 0,
            model_calls: 0,
            agent_stack: Vec::new(),
            dialogs: Vec::new(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Agent invocations so far in this turn.
    pub fn recursion_depth(&self) -> u32 {
        self.recursion_depth
    }

    pub fn model_calls(&self) -> u32 {
        self.model_calls
    }

    /// Top of the routing stack: the agent the next hand-off goes to.
    pub fn current_agent_id(&self) -> Option<&str> {
        self.agent_stack.last().map(String::as_str)
    }

    pub fn agent_stack(&self) -> &[String] {
        &self.agent_stack
    }

    pub fn push_agent(&mut self, agent_id: impl Into<String>) {
        let agent_id = agent_id.into();
        if self.current_agent_id() != Some(agent_id.as_str()) {
            self.agent_stack.push(agent_id);
        }
    }

    /// Entries the engine appended to the caller's history during this turn.
    pub fn dialogs(&self) -> &[Message] {
        &self.dialogs
    }

    pub(crate) fn enter_agent(&mut self) -> u32 {
        self.recursion_depth = self.recursion_depth.saturating_add(1);
        self.recursion_depth
    }

    pub(crate) fn count_model_call(&mut self) {
        self.model_calls = self.model_calls.saturating_add(1);
    }

    pub(crate) fn record(&mut self, entry: Message) {
        self.dialogs.push(entry);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    TextDelta(String),
    FunctionCallDelta(FunctionCall),
    ReplyComplete(Message),
}

pub type ChatEventObserver = Arc<dyn Fn(ChatEvent) + Send + Sync>;

#[derive(Clone, Default)]
pub struct InvokeAgentOptions {
    pub use_stream: bool,
    pub observer: Option<ChatEventObserver>,
}

impl InvokeAgentOptions {
    pub fn streaming() -> Self {
        Self {
            use_stream: true,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: ChatEventObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub(crate) fn notify(&self, event: ChatEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }
}

impl Debug for InvokeAgentOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvokeAgentOptions")
            .field("use_stream", &self.use_stream)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A terminal entry was appended to the caller's history.
    Completed { reply: Message },
    /// The recursion ceiling was hit before another model call.
    Aborted {
        agent_id: String,
        depth: u32,
        max_depth: u32,
    },
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn reply(&self) -> Option<&Message> {
        match self {
            Self::Completed { reply } => Some(reply),
            Self::Aborted { .. } => None,
        }
    }
}

/// Keeps the text after the last `/` or `.`; some models echo an
/// agent-qualified function name.
///
/// ```rust
/// use fchat::normalize_function_name;
///
/// assert_eq!(normalize_function_name("AgentX/real_function"), "real_function");
/// assert_eq!(normalize_function_name("tools.lookup"), "lookup");
/// assert_eq!(normalize_function_name("lookup"), "lookup");
/// ```
pub fn normalize_function_name(name: &str) -> &str {
    match name.rsplit(['/', '.']).next() {
        Some(last) if !last.trim().is_empty() => last.trim(),
        _ => name.trim(),
    }
}
