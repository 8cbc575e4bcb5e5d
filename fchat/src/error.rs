//! Turn-engine errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use fmemory::MemoryError;
use fprovider::ProviderError;
use ftooling::{FunctionError, FunctionErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    AgentNotFound,
    Provider,
    Dispatch,
    Storage,
    Cancelled,
}

/// Where in the turn a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorPhase {
    AgentLoad,
    PreContext,
    ModelCall,
    PostContext,
    Dispatch,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub phase: Option<ChatErrorPhase>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            phase: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn agent_not_found(agent_id: &str) -> Self {
        Self::new(
            ChatErrorKind::AgentNotFound,
            format!("agent '{agent_id}' is not registered"),
        )
        .with_phase(ChatErrorPhase::AgentLoad)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Provider, message)
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Dispatch, message).with_phase(ChatErrorPhase::Dispatch)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Storage, message).with_phase(ChatErrorPhase::Storage)
    }

    pub fn cancelled(phase: ChatErrorPhase) -> Self {
        Self::new(ChatErrorKind::Cancelled, "turn was cancelled").with_phase(phase)
    }

    pub fn with_phase(mut self, phase: ChatErrorPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ChatErrorKind::Cancelled
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.phase {
            Some(phase) => write!(f, "{:?} during {:?}: {}", self.kind, phase, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        ChatError::provider(value.to_string()).with_phase(ChatErrorPhase::ModelCall)
    }
}

impl From<FunctionError> for ChatError {
    fn from(value: FunctionError) -> Self {
        if value.kind == FunctionErrorKind::Cancelled {
            return ChatError::cancelled(ChatErrorPhase::Dispatch);
        }

        ChatError::dispatch(value.to_string())
    }
}

impl From<MemoryError> for ChatError {
    fn from(value: MemoryError) -> Self {
        ChatError::storage(value.to_string())
    }
}
