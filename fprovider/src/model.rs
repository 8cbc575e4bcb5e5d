//! Dialog entries and provider-agnostic request/response types.
//!
//! ```rust
//! use fprovider::{Message, ModelRequest, ProviderErrorKind, Role};
//!
//! let ok = ModelRequest::new_validated(
//!     "gpt-4o-mini",
//!     vec![Message::new(Role::User, "What's the weather?")],
//! );
//! assert!(ok.is_ok());
//!
//! let err = ModelRequest::new_validated("", vec![Message::new(Role::User, "hi")])
//!     .err()
//!     .expect("empty model should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//! ```

use std::fmt::{Display, Formatter};

use fcommon::{GenerationOptions, MetadataMap};
use serde::{Deserialize, Serialize};

use crate::{Agent, ProviderError, ProviderErrorKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProviderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let role = match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Function => "function",
        };

        f.write_str(role)
    }
}

/// One entry of a dialog history.
///
/// `message_id` links an entry to the user message it answers; entries derived
/// from another entry keep that link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_args: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_label: Option<String>,
    #[serde(default)]
    pub stop_completion: bool,
    #[serde(default)]
    pub is_streaming: bool,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            message_id: None,
            current_agent_id: None,
            tool_call_id: None,
            function_name: None,
            function_args: None,
            indication: None,
            message_label: None,
            stop_completion: false,
            is_streaming: false,
        }
    }

    /// Builds a new entry that keeps this entry's linkage and function-call fields.
    pub fn derive(&self, role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            message_id: self.message_id.clone(),
            current_agent_id: self.current_agent_id.clone(),
            tool_call_id: self.tool_call_id.clone(),
            function_name: self.function_name.clone(),
            function_args: self.function_args.clone(),
            indication: self.indication.clone(),
            message_label: self.message_label.clone(),
            stop_completion: false,
            is_streaming: self.is_streaming,
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.current_agent_id = Some(agent_id.into());
        self
    }

    pub fn with_function_call(mut self, call: &FunctionCall) -> Self {
        self.tool_call_id = Some(call.id.clone());
        self.function_name = Some(call.name.clone());
        self.function_args = Some(call.arguments.clone());
        self
    }

    pub fn with_indication(mut self, indication: impl Into<String>) -> Self {
        self.indication = Some(indication.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.message_label = Some(label.into());
        self
    }

    pub fn streaming(mut self, is_streaming: bool) -> Self {
        self.is_streaming = is_streaming;
        self
    }

    pub fn is_function_call(&self) -> bool {
        self.role == Role::Function
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputItem {
    Message(Message),
    FunctionCall(FunctionCall),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    FunctionCall,
    ContentFiltered,
    Cancelled,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    pub provider: ProviderId,
    pub model: String,
    pub output: Vec<OutputItem>,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

impl ModelResponse {
    /// Collapses provider output into the single reply entry a turn works with.
    ///
    /// The first function call wins and yields a `Function` entry; otherwise all
    /// assistant text is concatenated into one `Assistant` entry.
    pub fn into_reply(self) -> Message {
        let mut text = String::new();
        let mut indication = None;

        for item in self.output {
            match item {
                OutputItem::FunctionCall(call) => {
                    let mut reply = Message::new(Role::Function, text).with_function_call(&call);
                    reply.indication = indication;
                    return reply;
                }
                OutputItem::Message(message) => {
                    if message.role == Role::Assistant {
                        text.push_str(&message.content);
                        if message.indication.is_some() {
                            indication = message.indication;
                        }
                    }
                }
            }
        }

        let mut reply = Message::new(Role::Assistant, text);
        reply.indication = indication;
        reply
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub system_instruction: Option<String>,
    pub options: GenerationOptions,
    pub functions: Vec<FunctionDefinition>,
    pub metadata: MetadataMap,
}

impl ModelRequest {
    pub fn builder(model: impl Into<String>) -> ModelRequestBuilder {
        ModelRequestBuilder::new(model)
    }

    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            system_instruction: None,
            options: GenerationOptions::default(),
            functions: Vec::new(),
            metadata: MetadataMap::new(),
        }
    }

    pub fn new_validated(
        model: impl Into<String>,
        messages: Vec<Message>,
    ) -> Result<Self, ProviderError> {
        let request = Self::new(model, messages);
        request.validate()?;
        Ok(request)
    }

    /// Starts a builder preloaded with the agent's instruction, functions and
    /// output-token limit.
    pub fn for_agent(agent: &Agent, model: impl Into<String>) -> ModelRequestBuilder {
        let mut builder = ModelRequestBuilder::new(model).functions(agent.functions.clone());

        if let Some(instruction) = agent.rendered_instruction() {
            builder = builder.system_instruction(instruction);
        }

        if let Some(max_tokens) = agent.llm_config.max_output_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        builder
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_functions(mut self, functions: Vec<FunctionDefinition>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn enable_streaming(mut self) -> Self {
        self.options.stream = true;
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if self.messages.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one message is required",
            ));
        }

        if let Some(max_tokens) = self.options.max_tokens
            && max_tokens == 0
        {
            return Err(ProviderError::invalid_request(
                "max_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.options.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ProviderError::new(
                ProviderErrorKind::InvalidRequest,
                "temperature must be in the inclusive range 0.0..=2.0",
                false,
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequestBuilder {
    model: String,
    messages: Vec<Message>,
    system_instruction: Option<String>,
    options: GenerationOptions,
    functions: Vec<FunctionDefinition>,
    metadata: MetadataMap,
}

impl ModelRequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system_instruction: None,
            options: GenerationOptions::default(),
            functions: Vec::new(),
            metadata: MetadataMap::new(),
        }
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Appends an instruction fragment on a new line after any existing text.
    pub fn append_instruction(mut self, fragment: &str) -> Self {
        if fragment.is_empty() {
            return self;
        }

        match self.system_instruction.as_mut() {
            Some(existing) if !existing.is_empty() => {
                existing.push('\n');
                existing.push_str(fragment);
            }
            _ => self.system_instruction = Some(fragment.to_string()),
        }

        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn functions(mut self, functions: Vec<FunctionDefinition>) -> Self {
        self.functions = functions;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn metadata_map(mut self, metadata: &MetadataMap) -> Self {
        self.metadata
            .extend(metadata.iter().map(|(key, value)| (key.clone(), value.clone())));
        self
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.options.stream = stream;
        self
    }

    pub fn enable_streaming(self) -> Self {
        self.streaming(true)
    }

    pub fn build(self) -> Result<ModelRequest, ProviderError> {
        let request = ModelRequest {
            model: self.model,
            messages: self.messages,
            system_instruction: self.system_instruction,
            options: self.options,
            functions: self.functions,
            metadata: self.metadata,
        };

        request.validate()?;
        Ok(request)
    }
}
