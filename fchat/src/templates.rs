//! Response templates that turn a function result straight into a reply.
//!
//! A template is keyed by agent id and function name. `{{content}}` expands to the
//! function's output and `{{name}}` to the top-level argument `name`.
//!
//! ```rust
//! use fchat::{ResponseTemplateRenderer, StaticResponseTemplates};
//! use fprovider::{FunctionCall, Message, Role};
//!
//! let templates = StaticResponseTemplates::new()
//!     .with_template("agent-a", "book_table", "Booked a table for {{guests}}.");
//!
//! let result = Message::new(Role::Function, "ok").with_function_call(&FunctionCall {
//!     id: "call_1".to_string(),
//!     name: "book_table".to_string(),
//!     arguments: r#"{"guests":4}"#.to_string(),
//! });
//!
//! assert_eq!(
//!     templates.render("agent-a", &result).as_deref(),
//!     Some("Booked a table for 4.")
//! );
//! ```

use std::collections::HashMap;

use fmemory::states_from_args;
use fprovider::Message;

pub trait ResponseTemplateRenderer: Send + Sync {
    /// Rendered reply for `result`, or `None` when no template applies.
    fn render(&self, agent_id: &str, result: &Message) -> Option<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResponseTemplates;

impl ResponseTemplateRenderer for NoopResponseTemplates {
    fn render(&self, _agent_id: &str, _result: &Message) -> Option<String> {
        None
    }
}

#[derive(Debug, Default, Clone)]
pub struct StaticResponseTemplates {
    templates: HashMap<(String, String), String>,
}

impl StaticResponseTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(
        mut self,
        agent_id: impl Into<String>,
        function_name: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.templates
            .insert((agent_id.into(), function_name.into()), template.into());
        self
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl ResponseTemplateRenderer for StaticResponseTemplates {
    fn render(&self, agent_id: &str, result: &Message) -> Option<String> {
        let function_name = result.function_name.as_deref()?;
        let template = self
            .templates
            .get(&(agent_id.to_string(), function_name.to_string()))?;

        let mut rendered = template.replace("{{content}}", &result.content);
        if let Some(args) = result.function_args.as_deref()
            && let Ok(entries) = states_from_args(args)
        {
            for (key, value) in entries {
                rendered = rendered.replace(&format!("{{{{{key}}}}}"), &value);
            }
        }

        let rendered = rendered.trim();
        (!rendered.is_empty()).then(|| rendered.to_string())
    }
}
