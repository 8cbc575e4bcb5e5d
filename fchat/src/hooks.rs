//! Observation points in the turn loop.
//!
//! ```rust
//! use fchat::{NoopTurnRuntimeHooks, TurnRuntimeHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn TurnRuntimeHooks) {}
//!
//! assert_hooks_trait(&NoopTurnRuntimeHooks);
//! ```

use fcommon::ConversationId;
use fprovider::{Message, ProviderError};

pub trait TurnRuntimeHooks: Send + Sync {
    fn on_agent_start(&self, _conversation_id: &ConversationId, _agent_id: &str, _depth: u32) {}

    fn on_recursion_limit(
        &self,
        _conversation_id: &ConversationId,
        _agent_id: &str,
        _depth: u32,
        _max_depth: u32,
    ) {
    }

    fn on_model_failure(
        &self,
        _conversation_id: &ConversationId,
        _agent_id: &str,
        _error: &ProviderError,
    ) {
    }

    fn on_function_dispatch(
        &self,
        _conversation_id: &ConversationId,
        _agent_id: &str,
        _function_name: &str,
    ) {
    }

    fn on_reply_committed(
        &self,
        _conversation_id: &ConversationId,
        _agent_id: &str,
        _entry: &Message,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTurnRuntimeHooks;

impl TurnRuntimeHooks for NoopTurnRuntimeHooks {}
