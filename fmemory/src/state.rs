//! Conversation key/value state and capture from function-call arguments.
//!
//! ```rust
//! use fmemory::states_from_args;
//!
//! let states = states_from_args(r#"{"city":"Paris","days":3,"note":null}"#)
//!     .expect("object arguments should parse");
//!
//! assert_eq!(states, vec![
//!     ("city".to_string(), "Paris".to_string()),
//!     ("days".to_string(), "3".to_string()),
//! ]);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use fcommon::{BoxFuture, ConversationId};
use serde_json::Value;

use crate::MemoryError;

pub type ConversationStates = BTreeMap<String, String>;

/// Flattens the top level of a JSON object into state entries.
///
/// Strings are kept verbatim, nulls are skipped and every other value is stored
/// as compact JSON. Entries come back sorted by key.
pub fn states_from_args(args_json: &str) -> Result<Vec<(String, String)>, MemoryError> {
    let value: Value = serde_json::from_str(args_json)
        .map_err(|err| MemoryError::invalid_request(format!("invalid JSON arguments: {err}")))?;

    let Value::Object(map) = value else {
        return Err(MemoryError::invalid_request(
            "function arguments are not a JSON object",
        ));
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key, text)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

pub trait ConversationStateStore: Send + Sync {
    fn load_states<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<ConversationStates, MemoryError>>;

    fn set_states<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        entries: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;

    /// Saves every top-level argument as a state entry and returns how many were written.
    fn save_state_by_args<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        args_json: &'a str,
    ) -> BoxFuture<'a, Result<usize, MemoryError>> {
        Box::pin(async move {
            let entries = states_from_args(args_json)?;
            let written = entries.len();
            if written > 0 {
                self.set_states(conversation_id, entries).await?;
            }
            Ok(written)
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    states: Mutex<HashMap<ConversationId, ConversationStates>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStateStore for InMemoryStateStore {
    fn load_states<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<ConversationStates, MemoryError>> {
        Box::pin(async move {
            let states = self
                .states
                .lock()
                .map_err(|_| MemoryError::storage("state store lock poisoned"))?;

            Ok(states.get(conversation_id).cloned().unwrap_or_default())
        })
    }

    fn set_states<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        entries: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let mut states = self
                .states
                .lock()
                .map_err(|_| MemoryError::storage("state store lock poisoned"))?;

            states
                .entry(conversation_id.clone())
                .or_default()
                .extend(entries);

            Ok(())
        })
    }
}
