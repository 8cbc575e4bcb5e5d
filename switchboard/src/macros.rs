/// Creates a single dialog [`Message`](crate::Message) from a role shorthand.
///
/// ```rust
/// use switchboard::{Role, sb_msg};
///
/// let message = sb_msg!(assistant => "Done.");
/// assert_eq!(message.role, Role::Assistant);
/// assert_eq!(message.content, "Done.");
/// ```
#[macro_export]
macro_rules! sb_msg {
    (system => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::System, $content)
    };
    (user => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::User, $content)
    };
    (assistant => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::Assistant, $content)
    };
    (function => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::Function, $content)
    };
    ($role:ident => $content:expr $(,)?) => {
        compile_error!("unsupported role: use system, user, assistant, or function");
    };
}

/// Creates a `Vec<Message>` from role/content pairs.
///
/// ```rust
/// use switchboard::{Role, sb_messages};
///
/// let messages = sb_messages![
///     system => "You are concise.",
///     user => "Where is my order?",
/// ];
///
/// assert_eq!(messages.len(), 2);
/// assert_eq!(messages[0].role, Role::System);
/// assert_eq!(messages[1].role, Role::User);
/// ```
#[macro_export]
macro_rules! sb_messages {
    () => {
        Vec::<$crate::Message>::new()
    };
    ($($role:ident => $content:expr),+ $(,)?) => {
        vec![$($crate::sb_msg!($role => $content)),+]
    };
}

/// Creates an [`Agent`](crate::Agent) bound to a provider and model.
///
/// ```rust
/// use switchboard::{AgentType, sb_agent};
///
/// let agent = sb_agent!("router", routing, "openai", "gpt-4o-mini");
/// assert_eq!(agent.agent_type, AgentType::Routing);
/// assert_eq!(agent.llm_config.provider.as_deref(), Some("openai"));
/// ```
#[macro_export]
macro_rules! sb_agent {
    ($id:expr, routing, $provider:expr, $model:expr $(,)?) => {
        $crate::agent($id, $provider, $model).with_type($crate::AgentType::Routing)
    };
    ($id:expr, routing, $provider:expr, $model:expr, $instruction:expr $(,)?) => {
        $crate::agent($id, $provider, $model)
            .with_type($crate::AgentType::Routing)
            .with_instruction($instruction)
    };
    ($id:expr, $provider:expr, $model:expr $(,)?) => {
        $crate::agent($id, $provider, $model)
    };
    ($id:expr, $provider:expr, $model:expr, $instruction:expr $(,)?) => {
        $crate::agent($id, $provider, $model).with_instruction($instruction)
    };
}
