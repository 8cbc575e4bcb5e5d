//! Agent lookup by id.
//!
//! ```rust
//! use fchat::{AgentLoader, InMemoryAgentRegistry};
//! use fprovider::Agent;
//!
//! let mut registry = InMemoryAgentRegistry::new();
//! registry.register(Agent::new("agent-a", "Helper"));
//!
//! assert!(registry.contains("agent-a"));
//! ```

use fcommon::{BoxFuture, Registry};
use fprovider::Agent;

use crate::ChatError;

pub trait AgentLoader: Send + Sync {
    fn load_agent<'a>(&'a self, agent_id: &'a str) -> BoxFuture<'a, Result<Agent, ChatError>>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryAgentRegistry {
    agents: Registry<String, Agent>,
}

impl InMemoryAgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, agent: Agent) -> Option<Agent> {
        self.agents.insert(agent.id.clone(), agent)
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.agents.contains_key(agent_id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl AgentLoader for InMemoryAgentRegistry {
    fn load_agent<'a>(&'a self, agent_id: &'a str) -> BoxFuture<'a, Result<Agent, ChatError>> {
        Box::pin(async move {
            self.agents
                .get(agent_id)
                .cloned()
                .ok_or_else(|| ChatError::agent_not_found(agent_id))
        })
    }
}
