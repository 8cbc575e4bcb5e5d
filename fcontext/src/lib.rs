//! Context provider pipeline run around each model call.
//!
//! Providers contribute extra dialog entries, instruction fragments and metadata
//! before the call, and observe the exchange after it. A failing provider never
//! affects the others or the turn.
//!
//! ```rust
//! use fcontext::{ContextOrchestrator, ConversationMemoryProvider};
//! use fmemory::InMemoryConversationStore;
//! use std::sync::Arc;
//!
//! let orchestrator = ContextOrchestrator::builder()
//!     .provider(ConversationMemoryProvider::new(Arc::new(InMemoryConversationStore::new())))
//!     .build();
//!
//! assert_eq!(orchestrator.provider_names(), vec!["conversation_memory"]);
//! ```

mod error;
mod memory;
mod orchestrator;
mod provider;
mod types;

pub mod prelude {
    pub use crate::{
        AiContext, ContextError, ContextErrorKind, ContextOrchestrator, ContextPhase,
        ContextProvider, ConversationMemoryProvider, InvokedContext, InvokingContext,
    };
}

pub use error::{ContextError, ContextErrorKind};
pub use memory::{CONVERSATION_HISTORY_INSTRUCTION, ConversationMemoryProvider};
pub use orchestrator::{ContextOrchestrator, ContextOrchestratorBuilder};
pub use provider::ContextProvider;
pub use types::{AiContext, ContextPhase, InvokedContext, InvokingContext};
