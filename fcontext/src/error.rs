//! Context provider failures.

use std::error::Error;
use std::fmt::{Display, Formatter};

use fcommon::Interrupted;
use fmemory::MemoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextErrorKind {
    Provider,
    Storage,
    Panicked,
    Timeout,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextError {
    pub kind: ContextErrorKind,
    pub message: String,
    pub provider: Option<String>,
}

impl ContextError {
    pub fn new(kind: ContextErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider: None,
        }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ContextErrorKind::Provider, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ContextErrorKind::Storage, message)
    }

    pub fn panicked(message: impl Into<String>) -> Self {
        Self::new(ContextErrorKind::Panicked, message)
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

impl From<MemoryError> for ContextError {
    fn from(value: MemoryError) -> Self {
        Self::storage(value.to_string())
    }
}

impl From<Interrupted> for ContextError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Cancelled => Self::new(ContextErrorKind::Cancelled, "hook cancelled"),
            Interrupted::TimedOut => Self::new(ContextErrorKind::Timeout, "hook timed out"),
        }
    }
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.provider {
            Some(provider) => write!(
                f,
                "{:?} [provider={}]: {}",
                self.kind, provider, self.message
            ),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ContextError {}
