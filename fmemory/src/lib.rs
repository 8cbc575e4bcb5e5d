//! Conversation dialog and state persistence.
//!
//! ```rust
//! use fmemory::{ConversationStateStore, InMemoryConversationStore, InMemoryStateStore};
//!
//! fn assert_states(_store: &dyn ConversationStateStore) {}
//!
//! let _dialogs = InMemoryConversationStore::new();
//! assert_states(&InMemoryStateStore::new());
//! ```

mod error;
mod filesystem;
mod state;
mod store;

pub mod prelude {
    pub use crate::{
        ConversationStateStore, ConversationStates, ConversationStore,
        FilesystemConversationStore, InMemoryConversationStore, InMemoryStateStore, MemoryError,
        MemoryErrorKind,
    };
}

pub use error::{MemoryError, MemoryErrorKind};
pub use filesystem::FilesystemConversationStore;
pub use state::{ConversationStateStore, ConversationStates, InMemoryStateStore, states_from_args};
pub use store::{ConversationStore, InMemoryConversationStore};
