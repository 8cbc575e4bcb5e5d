//! Snapshots handed to providers and the context they contribute back.
//!
//! ```rust
//! use fcontext::AiContext;
//! use fprovider::{Message, Role};
//!
//! let history = vec![
//!     Message::new(Role::User, "earlier"),
//!     Message::new(Role::Assistant, "reply"),
//!     Message::new(Role::User, "live turn"),
//! ];
//! let context = AiContext::new().with_message(Message::new(Role::System, "injected"));
//!
//! let working = context.apply_to(&history);
//! assert_eq!(working[2].content, "injected");
//! assert_eq!(working[3].content, "live turn");
//! assert_eq!(history.len(), 3);
//! ```

use std::fmt::{Display, Formatter};

use fcommon::{ConversationId, MetadataMap};
use fprovider::{Agent, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPhase {
    PreCall,
    PostCall,
}

impl ContextPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreCall => "pre_call",
            Self::PostCall => "post_call",
        }
    }
}

impl Display for ContextPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Additive contribution from one provider, or the merge of several.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiContext {
    pub messages: Vec<Message>,
    pub system_instruction: Option<String>,
    pub metadata: MetadataMap,
}

impl AiContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
            && self
                .system_instruction
                .as_deref()
                .is_none_or(str::is_empty)
            && self.metadata.is_empty()
    }

    /// Folds `other` into `self`: entries append, metadata is last-writer-wins and
    /// instruction fragments are joined with a newline.
    pub fn merge(&mut self, other: AiContext) {
        self.messages.extend(other.messages);
        self.metadata.extend(other.metadata);

        let Some(fragment) = other.system_instruction.filter(|text| !text.is_empty()) else {
            return;
        };

        match self.system_instruction.as_mut() {
            Some(existing) if !existing.is_empty() => {
                existing.push('\n');
                existing.push_str(&fragment);
            }
            _ => self.system_instruction = Some(fragment),
        }
    }

    /// Working copy of `dialogs` with the contributed entries placed just before
    /// the most recent entry.
    pub fn apply_to(&self, dialogs: &[Message]) -> Vec<Message> {
        let mut working = Vec::with_capacity(dialogs.len() + self.messages.len());
        let split = dialogs.len().saturating_sub(1);

        working.extend_from_slice(&dialogs[..split]);
        working.extend(self.messages.iter().cloned());
        working.extend_from_slice(&dialogs[split..]);
        working
    }
}

/// Read-only view handed to providers before the model call.
#[derive(Debug, Clone, Copy)]
pub struct InvokingContext<'a> {
    pub agent: &'a Agent,
    pub dialogs: &'a [Message],
    pub conversation_id: &'a ConversationId,
    pub metadata: &'a MetadataMap,
}

impl<'a> InvokingContext<'a> {
    pub fn new(
        agent: &'a Agent,
        dialogs: &'a [Message],
        conversation_id: &'a ConversationId,
        metadata: &'a MetadataMap,
    ) -> Self {
        Self {
            agent,
            dialogs,
            conversation_id,
            metadata,
        }
    }
}

/// Read-only view handed to providers after the model call.
///
/// `request_dialogs` is the exact working history sent to the model, injected
/// entries included.
#[derive(Debug, Clone, Copy)]
pub struct InvokedContext<'a> {
    pub agent: &'a Agent,
    pub request_dialogs: &'a [Message],
    pub response: &'a Message,
    pub conversation_id: &'a ConversationId,
    pub metadata: &'a MetadataMap,
}

impl<'a> InvokedContext<'a> {
    pub fn new(
        agent: &'a Agent,
        request_dialogs: &'a [Message],
        response: &'a Message,
        conversation_id: &'a ConversationId,
        metadata: &'a MetadataMap,
    ) -> Self {
        Self {
            agent,
            request_dialogs,
            response,
            conversation_id,
            metadata,
        }
    }
}
