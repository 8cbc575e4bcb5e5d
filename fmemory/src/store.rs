//! Conversation dialog storage contract and in-memory implementation.
//!
//! ```rust
//! use fmemory::{ConversationStore, InMemoryConversationStore};
//!
//! fn assert_store(_store: &dyn ConversationStore) {}
//!
//! assert_store(&InMemoryConversationStore::new());
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use fcommon::{BoxFuture, ConversationId};
use fprovider::Message;

use crate::MemoryError;

pub trait ConversationStore: Send + Sync {
    fn load_dialogs<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Vec<Message>, MemoryError>>;

    fn append_dialogs<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        dialogs: Vec<Message>,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    conversations: Mutex<HashMap<ConversationId, Vec<Message>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn load_dialogs<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Vec<Message>, MemoryError>> {
        Box::pin(async move {
            let conversations = self
                .conversations
                .lock()
                .map_err(|_| MemoryError::storage("conversation store lock poisoned"))?;

            Ok(conversations
                .get(conversation_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn append_dialogs<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        dialogs: Vec<Message>,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let mut conversations = self
                .conversations
                .lock()
                .map_err(|_| MemoryError::storage("conversation store lock poisoned"))?;

            conversations
                .entry(conversation_id.clone())
                .or_default()
                .extend(dialogs);

            Ok(())
        })
    }
}
