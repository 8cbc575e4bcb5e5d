//! Streaming event contracts and the function-call snapshot fold.
//!
//! ```rust
//! use fprovider::{BoxedEventStream, FunctionCall, FunctionCallSnapshots, StreamEvent, VecEventStream};
//!
//! let stream = VecEventStream::new(vec![Ok(StreamEvent::TextDelta("hello".into()))]);
//! let _boxed: BoxedEventStream<'static> = Box::pin(stream);
//!
//! let mut calls = FunctionCallSnapshots::default();
//! calls.record(FunctionCall { id: "c1".into(), name: "lookup".into(), arguments: "{\"q\":".into() });
//! calls.record(FunctionCall { id: "c1".into(), name: "lookup".into(), arguments: "{\"q\":1}".into() });
//! assert_eq!(calls.first().map(|call| call.arguments.as_str()), Some("{\"q\":1}"));
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{FunctionCall, Message, ModelResponse, ProviderError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    TextDelta(String),
    /// Cumulative snapshot of one function call: each event for an id
    /// supersedes the previous one.
    FunctionCallDelta(FunctionCall),
    MessageComplete(Message),
    ResponseComplete(ModelResponse),
}

/// Provider stream contract.
///
/// Invariants for consumers:
/// - Events are emitted in source order.
/// - `TextDelta` may appear zero or more times and is incremental.
/// - `FunctionCallDelta` may appear zero or more times per call id and carries the
///   call as accumulated so far; the last snapshot for an id is the complete call.
/// - `MessageComplete` and `ResponseComplete` are terminal milestones and, when present,
///   arrive after all related deltas.
/// - Once the stream yields `None`, it must not yield additional items.
pub trait ModelEventStream: Stream<Item = Result<StreamEvent, ProviderError>> + Send {}

impl<T> ModelEventStream for T where T: Stream<Item = Result<StreamEvent, ProviderError>> + Send {}

pub type BoxedEventStream<'a> = Pin<Box<dyn ModelEventStream + 'a>>;

/// Latest snapshot per function-call id, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionCallSnapshots {
    calls: Vec<FunctionCall>,
}

impl FunctionCallSnapshots {
    /// Replaces the stored snapshot for `snapshot.id`, or starts tracking it.
    ///
    /// A snapshot without an id continues the most recent call. A blank name
    /// keeps the name already seen for that call.
    pub fn record(&mut self, snapshot: FunctionCall) {
        let slot = if snapshot.id.is_empty() {
            self.calls.last_mut()
        } else {
            self.calls.iter_mut().find(|call| call.id == snapshot.id)
        };

        match slot {
            Some(existing) => {
                if !snapshot.id.is_empty() {
                    existing.id = snapshot.id;
                }
                if !snapshot.name.is_empty() {
                    existing.name = snapshot.name;
                }
                existing.arguments = snapshot.arguments;
            }
            None => self.calls.push(snapshot),
        }
    }

    pub fn first(&self) -> Option<&FunctionCall> {
        self.calls.first()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn into_calls(self) -> Vec<FunctionCall> {
        self.calls
    }
}

#[derive(Debug)]
pub struct VecEventStream {
    events: VecDeque<Result<StreamEvent, ProviderError>>,
}

impl VecEventStream {
    pub fn new(events: Vec<Result<StreamEvent, ProviderError>>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

impl Stream for VecEventStream {
    type Item = Result<StreamEvent, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<StreamEvent, ProviderError>>> {
        Poll::Ready(self.events.pop_front())
    }
}
