//! Function execution context, outputs and dispatch outcomes.

use fcommon::{CancellationToken, ConversationId, MetadataMap, TraceId};
use fprovider::{Message, Role};

#[derive(Debug, Clone)]
pub struct FunctionExecutionContext {
    pub conversation_id: ConversationId,
    pub current_agent_id: Option<String>,
    pub trace_id: Option<TraceId>,
    pub metadata: MetadataMap,
    pub cancel: CancellationToken,
}

impl FunctionExecutionContext {
    pub fn new(conversation_id: impl Into<ConversationId>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            current_agent_id: None,
            trace_id: None,
            metadata: MetadataMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.current_agent_id = Some(agent_id.into());
        self
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
}

/// What a function hands back to the dispatcher.
///
/// `stop_completion` ends the turn with `content` as the assistant reply.
/// `next_agent_id` requests a hand-off before the engine recurses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionOutput {
    pub content: String,
    pub stop_completion: bool,
    pub next_agent_id: Option<String>,
}

impl FunctionOutput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn stop(content: impl Into<String>) -> Self {
        Self::new(content).with_stop(true)
    }

    pub fn with_stop(mut self, stop: bool) -> Self {
        self.stop_completion = stop;
        self
    }

    pub fn with_next_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.next_agent_id = Some(agent_id.into());
        self
    }
}

impl From<String> for FunctionOutput {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for FunctionOutput {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub result: Message,
    pub stop: bool,
    pub next_agent_id: Option<String>,
}

impl DispatchOutcome {
    /// Builds the function-role result entry from the originating call entry.
    pub fn from_output(call: &Message, output: FunctionOutput) -> Self {
        let mut result = call.derive(Role::Function, output.content);
        result.stop_completion = output.stop_completion;

        Self {
            result,
            stop: output.stop_completion,
            next_agent_id: output.next_agent_id,
        }
    }
}
