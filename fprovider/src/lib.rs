//! Provider contracts, dialog entries and agent definitions.
//!
//! ```rust
//! use fprovider::prelude::*;
//!
//! let request = ModelRequest::builder("gpt-4o-mini")
//!     .message(Message::new(Role::User, "hello"))
//!     .build()
//!     .expect("request should build");
//!
//! assert_eq!(request.messages.len(), 1);
//! assert!(ProviderRegistry::new().is_empty());
//! ```

pub mod agent;
pub mod error;
pub mod model;
pub mod prelude;
pub mod provider;
pub mod registry;
pub mod resilience;
pub mod stream;

pub use agent::{Agent, AgentType, DEFAULT_MAX_RECURSION_DEPTH, LlmConfig};
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    FunctionCall, FunctionDefinition, Message, ModelRequest, ModelRequestBuilder, ModelResponse,
    OutputItem, ProviderId, Role, StopReason, TokenUsage,
};
pub use provider::{ModelProvider, ProviderFuture};
pub use registry::ProviderRegistry;
pub use resilience::{
    NoopOperationHooks, ProviderOperationHooks, RetryPolicy, execute_with_retry,
};
pub use stream::{
    BoxedEventStream, FunctionCallSnapshots, ModelEventStream, StreamEvent, VecEventStream,
};
