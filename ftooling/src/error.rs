//! Function dispatch errors and classifications.

use std::error::Error;
use std::fmt::{Display, Formatter};

use fcommon::Interrupted;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionErrorKind {
    NotFound,
    InvalidArguments,
    Execution,
    Timeout,
    Cancelled,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionError {
    pub kind: FunctionErrorKind,
    pub message: String,
    pub retryable: bool,
    pub function_name: Option<String>,
    pub tool_call_id: Option<String>,
}

impl FunctionError {
    pub fn new(kind: FunctionErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            function_name: None,
            tool_call_id: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FunctionErrorKind::NotFound, message, false)
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(FunctionErrorKind::InvalidArguments, message, false)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(FunctionErrorKind::Execution, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FunctionErrorKind::Timeout, message, true)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(FunctionErrorKind::Cancelled, message, false)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FunctionErrorKind::Other, message, false)
    }

    pub fn with_function_name(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = Some(function_name.into());
        self
    }

    pub fn with_tool_call_id(mut self, tool_call_id: impl Into<String>) -> Self {
        self.tool_call_id = Some(tool_call_id.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind,
            FunctionErrorKind::InvalidArguments | FunctionErrorKind::NotFound
        )
    }
}

impl From<Interrupted> for FunctionError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Cancelled => Self::cancelled("function dispatch was cancelled"),
            Interrupted::TimedOut => Self::timeout("function dispatch timed out"),
        }
    }
}

impl Display for FunctionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.function_name, &self.tool_call_id) {
            (Some(name), Some(call_id)) => write!(
                f,
                "{:?} [function={}, call_id={}]: {}",
                self.kind, name, call_id, self.message
            ),
            (Some(name), None) => {
                write!(f, "{:?} [function={}]: {}", self.kind, name, self.message)
            }
            _ => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for FunctionError {}
