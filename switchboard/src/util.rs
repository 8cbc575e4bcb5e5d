//! Small convenience constructors for common types.

use crate::{
    Agent, ConversationId, FunctionDefinition, InvokeAgentOptions, LlmConfig, Message, Role,
    TurnContext,
};

pub fn system_message(content: impl Into<String>) -> Message {
    Message::new(Role::System, content)
}

pub fn user_message(content: impl Into<String>) -> Message {
    Message::new(Role::User, content)
}

pub fn assistant_message(content: impl Into<String>) -> Message {
    Message::new(Role::Assistant, content)
}

/// Task agent named after its id.
pub fn agent(id: impl Into<String>, provider: impl Into<String>, model: impl Into<String>) -> Agent {
    let id = id.into();
    Agent::new(id.clone(), id).with_llm_config(LlmConfig::new(provider, model))
}

pub fn function_definition(name: impl Into<String>, description: impl Into<String>) -> FunctionDefinition {
    FunctionDefinition {
        name: name.into(),
        description: description.into(),
        input_schema: "{\"type\":\"object\"}".to_string(),
    }
}

pub fn turn(conversation_id: impl Into<ConversationId>) -> TurnContext {
    TurnContext::new(conversation_id)
}

pub fn streaming_options() -> InvokeAgentOptions {
    InvokeAgentOptions::streaming()
}
