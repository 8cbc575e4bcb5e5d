use std::sync::{Arc, Mutex};
use std::time::Duration;

use fcommon::{BoxFuture, CancellationToken, ConversationId, MetadataMap};
use fcontext::{
    AiContext, ContextError, ContextOrchestrator, ContextProvider, InvokedContext,
    InvokingContext,
};
use fprovider::{Agent, Message, Role};

#[derive(Clone, Copy)]
enum Behavior {
    Contribute,
    Fail,
    Panic,
    Hang,
    CancelTurn,
}

struct RecordingProvider {
    name: String,
    priority: i32,
    behavior: Behavior,
    contribution: AiContext,
    log: Arc<Mutex<Vec<String>>>,
    cancel: Option<CancellationToken>,
}

impl RecordingProvider {
    fn new(name: &str, priority: i32, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            priority,
            behavior: Behavior::Contribute,
            contribution: AiContext::new(),
            log: Arc::clone(log),
            cancel: None,
        }
    }

    fn behaving(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    fn contributing(mut self, contribution: AiContext) -> Self {
        self.contribution = contribution;
        self
    }

    fn cancelling(mut self, cancel: CancellationToken) -> Self {
        self.behavior = Behavior::CancelTurn;
        self.cancel = Some(cancel);
        self
    }

    fn record(&self, phase: &str) {
        self.log
            .lock()
            .expect("log lock")
            .push(format!("{phase}:{}", self.name));
    }
}

impl ContextProvider for RecordingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn on_invoking<'a>(
        &'a self,
        _context: &'a InvokingContext<'a>,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<AiContext>, ContextError>> {
        Box::pin(async move {
            self.record("pre");
            match self.behavior {
                Behavior::Contribute => Ok(Some(self.contribution.clone())),
                Behavior::Fail => Err(ContextError::provider("lookup failed")),
                Behavior::Panic => panic!("provider bug"),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(None)
                }
                Behavior::CancelTurn => {
                    if let Some(cancel) = &self.cancel {
                        cancel.cancel();
                    }
                    Ok(Some(self.contribution.clone()))
                }
            }
        })
    }

    fn on_invoked<'a>(
        &'a self,
        _context: &'a InvokedContext<'a>,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), ContextError>> {
        Box::pin(async move {
            self.record("post");
            match self.behavior {
                Behavior::Fail => Err(ContextError::provider("audit failed")),
                Behavior::Panic => panic!("post hook bug"),
                _ => Ok(()),
            }
        })
    }
}

struct Fixture {
    agent: Agent,
    dialogs: Vec<Message>,
    conversation: ConversationId,
    metadata: MetadataMap,
    reply: Message,
}

impl Fixture {
    fn new() -> Self {
        Self {
            agent: Agent::new("agent-a", "Helper"),
            dialogs: vec![Message::new(Role::User, "hi")],
            conversation: ConversationId::from("conv-1"),
            metadata: MetadataMap::new(),
            reply: Message::new(Role::Assistant, "hello"),
        }
    }

    fn invoking(&self) -> InvokingContext<'_> {
        InvokingContext::new(&self.agent, &self.dialogs, &self.conversation, &self.metadata)
    }

    fn invoked(&self) -> InvokedContext<'_> {
        InvokedContext::new(
            &self.agent,
            &self.dialogs,
            &self.reply,
            &self.conversation,
            &self.metadata,
        )
    }
}

fn entries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().expect("log lock").clone()
}

#[tokio::test]
async fn pre_call_ascends_and_post_call_descends_by_priority() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let orchestrator = ContextOrchestrator::builder()
        .provider(RecordingProvider::new("p3", 3, &log))
        .provider(RecordingProvider::new("p1", 1, &log))
        .provider(RecordingProvider::new("p2", 2, &log))
        .build();
    let fixture = Fixture::new();
    let cancel = CancellationToken::new();

    orchestrator.run_pre_call(&fixture.invoking(), &cancel).await;
    orchestrator.run_post_call(&fixture.invoked(), &cancel).await;

    assert_eq!(
        entries(&log),
        vec!["pre:p1", "pre:p2", "pre:p3", "post:p3", "post:p2", "post:p1"]
    );
}

#[tokio::test]
async fn equal_priorities_keep_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let orchestrator = ContextOrchestrator::builder()
        .provider(RecordingProvider::new("first", 0, &log))
        .provider(RecordingProvider::new("second", 0, &log))
        .provider(RecordingProvider::new("early", -1, &log))
        .build();

    assert_eq!(orchestrator.provider_names(), vec!["early", "first", "second"]);
}

#[tokio::test]
async fn failing_provider_does_not_block_later_contributions() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let orchestrator = ContextOrchestrator::builder()
        .provider(RecordingProvider::new("a", 1, &log).behaving(Behavior::Fail))
        .provider(
            RecordingProvider::new("b", 2, &log)
                .contributing(AiContext::new().with_instruction("X")),
        )
        .build();
    let fixture = Fixture::new();

    let aggregate = orchestrator
        .run_pre_call(&fixture.invoking(), &CancellationToken::new())
        .await;

    assert_eq!(aggregate.system_instruction.as_deref(), Some("X"));
    assert_eq!(entries(&log), vec!["pre:a", "pre:b"]);
}

#[tokio::test]
async fn contributions_merge_in_priority_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let orchestrator = ContextOrchestrator::builder()
        .provider(
            RecordingProvider::new("late", 2, &log).contributing(
                AiContext::new()
                    .with_message(Message::new(Role::System, "summary"))
                    .with_instruction("second")
                    .with_metadata("source", "late"),
            ),
        )
        .provider(
            RecordingProvider::new("early", 1, &log).contributing(
                AiContext::new()
                    .with_message(Message::new(Role::System, "history"))
                    .with_instruction("first")
                    .with_metadata("source", "early"),
            ),
        )
        .build();
    let fixture = Fixture::new();

    let aggregate = orchestrator
        .run_pre_call(&fixture.invoking(), &CancellationToken::new())
        .await;

    let contents: Vec<&str> = aggregate
        .messages
        .iter()
        .map(|message| message.content.as_str())
        .collect();
    assert_eq!(contents, vec!["history", "summary"]);
    assert_eq!(aggregate.system_instruction.as_deref(), Some("first\nsecond"));
    assert_eq!(
        aggregate.metadata.get("source").map(String::as_str),
        Some("late")
    );

    let working = aggregate.apply_to(&fixture.dialogs);
    assert_eq!(working.len(), 3);
    assert_eq!(working[2].content, "hi");
    assert_eq!(fixture.dialogs.len(), 1);
}

#[tokio::test]
async fn panicking_providers_are_isolated_in_both_phases() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let orchestrator = ContextOrchestrator::builder()
        .provider(RecordingProvider::new("boom", 1, &log).behaving(Behavior::Panic))
        .provider(
            RecordingProvider::new("ok", 2, &log)
                .contributing(AiContext::new().with_metadata("k", "v")),
        )
        .build();
    let fixture = Fixture::new();
    let cancel = CancellationToken::new();

    let aggregate = orchestrator.run_pre_call(&fixture.invoking(), &cancel).await;
    orchestrator.run_post_call(&fixture.invoked(), &cancel).await;

    assert_eq!(aggregate.metadata.get("k").map(String::as_str), Some("v"));
    assert_eq!(
        entries(&log),
        vec!["pre:boom", "pre:ok", "post:ok", "post:boom"]
    );
}

#[tokio::test]
async fn slow_provider_is_timed_out_and_skipped() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let orchestrator = ContextOrchestrator::builder()
        .provider(RecordingProvider::new("slow", 1, &log).behaving(Behavior::Hang))
        .provider(
            RecordingProvider::new("fast", 2, &log)
                .contributing(AiContext::new().with_instruction("fast")),
        )
        .hook_timeout(Duration::from_millis(20))
        .build();
    let fixture = Fixture::new();

    let aggregate = orchestrator
        .run_pre_call(&fixture.invoking(), &CancellationToken::new())
        .await;

    assert_eq!(aggregate.system_instruction.as_deref(), Some("fast"));
}

#[tokio::test]
async fn cancellation_keeps_completed_merges_and_skips_remaining_providers() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let cancel = CancellationToken::new();
    let orchestrator = ContextOrchestrator::builder()
        .provider(
            RecordingProvider::new("first", 1, &log)
                .contributing(AiContext::new().with_instruction("kept"))
                .cancelling(cancel.clone()),
        )
        .provider(
            RecordingProvider::new("second", 2, &log)
                .contributing(AiContext::new().with_instruction("skipped")),
        )
        .build();
    let fixture = Fixture::new();

    let aggregate = orchestrator.run_pre_call(&fixture.invoking(), &cancel).await;

    assert_eq!(aggregate.system_instruction.as_deref(), Some("kept"));
    assert_eq!(entries(&log), vec!["pre:first"]);
}

#[tokio::test]
async fn post_call_failures_never_reach_the_caller() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let orchestrator = ContextOrchestrator::builder()
        .provider(RecordingProvider::new("audit", 1, &log).behaving(Behavior::Fail))
        .provider(RecordingProvider::new("metrics", 2, &log))
        .build();
    let fixture = Fixture::new();

    orchestrator
        .run_post_call(&fixture.invoked(), &CancellationToken::new())
        .await;

    assert_eq!(entries(&log), vec!["post:metrics", "post:audit"]);
}
