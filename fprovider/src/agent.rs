//! Agent definitions consumed by the turn engine.
//!
//! ```rust
//! use fprovider::{Agent, AgentType, LlmConfig};
//!
//! let agent = Agent::new("router-1", "Router")
//!     .with_type(AgentType::Routing)
//!     .with_llm_config(LlmConfig::new("openai", "gpt-4o-mini"));
//!
//! assert!(agent.is_routing());
//! assert_eq!(agent.llm_config.max_recursion_depth, 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::FunctionDefinition;

pub const DEFAULT_MAX_RECURSION_DEPTH: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    #[default]
    Task,
    Routing,
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub max_recursion_depth: u32,
    pub max_output_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            max_output_tokens: None,
        }
    }
}

impl LlmConfig {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            model: Some(model.into()),
            ..Self::default()
        }
    }

    pub fn with_max_recursion_depth(mut self, depth: u32) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub agent_type: AgentType,
    #[serde(default)]
    pub llm_config: LlmConfig,
    #[serde(default)]
    pub functions: Vec<FunctionDefinition>,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub knowledges: Vec<String>,
}

impl Agent {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            agent_type: AgentType::default(),
            llm_config: LlmConfig::default(),
            functions: Vec::new(),
            instruction: String::new(),
            knowledges: Vec::new(),
        }
    }

    pub fn with_type(mut self, agent_type: AgentType) -> Self {
        self.agent_type = agent_type;
        self
    }

    pub fn with_llm_config(mut self, llm_config: LlmConfig) -> Self {
        self.llm_config = llm_config;
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_function(mut self, function: FunctionDefinition) -> Self {
        self.functions.push(function);
        self
    }

    pub fn with_knowledge(mut self, knowledge: impl Into<String>) -> Self {
        self.knowledges.push(knowledge.into());
        self
    }

    pub fn is_routing(&self) -> bool {
        self.agent_type == AgentType::Routing
    }

    /// Instruction followed by knowledge snippets, one per line.
    pub fn rendered_instruction(&self) -> Option<String> {
        let parts = std::iter::once(self.instruction.as_str())
            .chain(self.knowledges.iter().map(String::as_str))
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}
