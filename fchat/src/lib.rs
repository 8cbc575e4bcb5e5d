//! Recursive turn engine over model providers, context providers and functions.
//!
//! ```rust
//! use fchat::{ChatPolicy, InvokeAgentOptions, TurnContext};
//!
//! let turn = TurnContext::new("conv-1").with_metadata("channel", "web");
//! let options = InvokeAgentOptions::default();
//!
//! assert_eq!(turn.recursion_depth(), 0);
//! assert!(!options.use_stream);
//! assert!(ChatPolicy::default().validate().is_ok());
//! ```

mod agents;
mod error;
mod hooks;
mod policy;
mod service;
mod templates;
mod turn;

pub mod prelude {
    pub use crate::{
        AgentLoader, ChatError, ChatErrorKind, ChatErrorPhase, ChatEvent, ChatEventObserver,
        ChatPolicy, ChatService, ChatServiceBuilder, InMemoryAgentRegistry, InvokeAgentOptions,
        ResponseTemplateRenderer, StaticResponseTemplates, TurnContext, TurnOutcome,
        TurnRuntimeHooks,
    };
    pub use fcommon::{CancellationToken, ConversationId, MetadataMap, TraceId};
}

pub use agents::{AgentLoader, InMemoryAgentRegistry};
pub use error::{ChatError, ChatErrorKind, ChatErrorPhase};
pub use hooks::{NoopTurnRuntimeHooks, TurnRuntimeHooks};
pub use policy::{CONTENT_FILTER_TEXT, ChatPolicy, MODEL_FAILURE_TEXT, ROUTING_FALLBACK_TEXT};
pub use service::{ChatService, ChatServiceBuilder};
pub use templates::{NoopResponseTemplates, ResponseTemplateRenderer, StaticResponseTemplates};
pub use turn::{
    ChatEvent, ChatEventObserver, InvokeAgentOptions, TurnContext, TurnOutcome,
    normalize_function_name,
};
