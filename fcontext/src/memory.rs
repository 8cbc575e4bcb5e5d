//! Conversation-history context provider backed by a [`ConversationStore`].

use std::sync::Arc;

use fcommon::{BoxFuture, CancellationToken};
use fmemory::ConversationStore;
use fprovider::Role;

use crate::{AiContext, ContextError, ContextProvider, InvokedContext, InvokingContext};

pub const CONVERSATION_HISTORY_INSTRUCTION: &str =
    "Use the conversation history to maintain context and provide relevant responses.";

const DEFAULT_HISTORY_WINDOW: usize = 10;

pub struct ConversationMemoryProvider {
    store: Arc<dyn ConversationStore>,
    window: usize,
}

impl ConversationMemoryProvider {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self {
            store,
            window: DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }
}

impl ContextProvider for ConversationMemoryProvider {
    fn name(&self) -> &str {
        "conversation_memory"
    }

    fn on_invoking<'a>(
        &'a self,
        context: &'a InvokingContext<'a>,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<AiContext>, ContextError>> {
        Box::pin(async move {
            let stored = self.store.load_dialogs(context.conversation_id).await?;
            let recent = stored
                .iter()
                .filter(|message| message.role != Role::Function)
                .rev()
                .take(self.window)
                .count();

            if recent == 0 {
                return Ok(None);
            }

            Ok(Some(
                AiContext::new().with_instruction(CONVERSATION_HISTORY_INSTRUCTION),
            ))
        })
    }

    fn on_invoked<'a>(
        &'a self,
        context: &'a InvokedContext<'a>,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), ContextError>> {
        Box::pin(async move {
            tracing::info!(
                phase = "context",
                event = "conversation_exchange",
                conversation_id = %context.conversation_id,
                agent_id = %context.agent.id,
                reply_role = %context.response.role,
                request_len = context.request_dialogs.len(),
            );
            Ok(())
        })
    }
}
