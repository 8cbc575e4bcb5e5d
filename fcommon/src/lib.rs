//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use fcommon::{ConversationId, GenerationOptions, MetadataMap, TraceId};
//!
//! let conversation = ConversationId::from("conv-1");
//! let trace = TraceId::new("trace-1");
//! let mut metadata = MetadataMap::new();
//! metadata.insert("tenant".to_string(), "acme".to_string());
//!
//! let options = GenerationOptions::default().with_max_tokens(256).enable_streaming();
//! assert_eq!(conversation.as_str(), "conv-1");
//! assert_eq!(trace.to_string(), "trace-1");
//! assert!(options.stream);
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use fcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Shared metadata and cross-crate identifier newtypes.
    //!
    //! ```rust
    //! use fcommon::{ConversationId, MetadataMap, TraceId};
    //!
    //! let conversation = ConversationId::new("conv-42");
    //! let trace = TraceId::from("trace-42");
    //! let mut metadata = MetadataMap::new();
    //! metadata.insert("env".to_string(), "test".to_string());
    //!
    //! assert_eq!(conversation.to_string(), "conv-42");
    //! assert_eq!(trace.as_str(), "trace-42");
    //! ```

    use std::collections::HashMap;
    use std::fmt::{Display, Formatter};

    pub type MetadataMap = HashMap<String, String>;

    #[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
    pub struct ConversationId(String);

    impl ConversationId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for ConversationId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for ConversationId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for ConversationId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct TraceId(String);

    impl TraceId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for TraceId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for TraceId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for TraceId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub mod model {
    //! Shared generation settings used by request types.
    //!
    //! ```rust
    //! use fcommon::GenerationOptions;
    //!
    //! let options = GenerationOptions::default()
    //!     .with_temperature(0.2)
    //!     .with_max_tokens(128)
    //!     .enable_streaming();
    //!
    //! assert_eq!(options.temperature, Some(0.2));
    //! assert_eq!(options.max_tokens, Some(128));
    //! assert!(options.stream);
    //! ```

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct GenerationOptions {
        pub temperature: Option<f32>,
        pub max_tokens: Option<u32>,
        pub stream: bool,
    }

    impl GenerationOptions {
        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = Some(max_tokens);
            self
        }

        pub fn with_streaming(mut self, stream: bool) -> Self {
            self.stream = stream;
            self
        }

        pub fn enable_streaming(self) -> Self {
            self.with_streaming(true)
        }
    }
}

pub mod registry {
    //! Generic registry map wrapper used by runtime registries.
    //!
    //! ```rust
    //! use fcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("alpha".to_string(), 1_u32);
    //!
    //! assert_eq!(registry.get("alpha"), Some(&1));
    //! assert!(registry.contains_key("alpha"));
    //! ```

    use std::borrow::Borrow;
    use std::collections::HashMap;
    use std::hash::Hash;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        items: HashMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn default() -> Self {
            Self {
                items: HashMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get(key)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.remove(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.items.values()
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub mod cancel {
    //! Cancellation and deadline guards for suspension points.
    //!
    //! ```rust
    //! use fcommon::{CancellationToken, Interrupted, run_bounded};
    //!
    //! let token = CancellationToken::new();
    //! token.cancel();
    //! let _guarded = run_bounded(async { 1 }, &token, None);
    //! assert!(token.is_cancelled());
    //! assert_eq!(Interrupted::Cancelled.to_string(), "cancelled");
    //! ```

    use std::fmt::{Display, Formatter};
    use std::future::Future;
    use std::pin::pin;
    use std::time::Duration;

    use futures_timer::Delay;
    use futures_util::future::{Either, select};

    pub use tokio_util::sync::CancellationToken;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Interrupted {
        Cancelled,
        TimedOut,
    }

    impl Display for Interrupted {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Cancelled => f.write_str("cancelled"),
                Self::TimedOut => f.write_str("timed out"),
            }
        }
    }

    /// Drives `future` until it completes, `cancel` fires, or `timeout` elapses.
    ///
    /// An already-cancelled token short-circuits without polling `future`.
    pub async fn run_bounded<F>(
        future: F,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        if cancel.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }

        let work = pin!(future);
        let cancelled = pin!(cancel.cancelled());
        let guarded = select(cancelled, work);

        let Some(limit) = timeout else {
            return match guarded.await {
                Either::Left(_) => Err(Interrupted::Cancelled),
                Either::Right((output, _)) => Ok(output),
            };
        };

        let deadline = pin!(Delay::new(limit));
        match select(guarded, deadline).await {
            Either::Left((Either::Left(_), _)) => Err(Interrupted::Cancelled),
            Either::Left((Either::Right((output, _)), _)) => Ok(output),
            Either::Right(_) => Err(Interrupted::TimedOut),
        }
    }
}

pub use cancel::{CancellationToken, Interrupted, run_bounded};
pub use context::{ConversationId, MetadataMap, TraceId};
pub use future::BoxFuture;
pub use model::GenerationOptions;
pub use registry::Registry;
