pub mod json;
pub mod prompts;
pub mod provider;
pub mod providers;
pub mod reasoning;

pub use provider::{LlmError, LlmProvider, Message, Role};
pub use reasoning::{LlmReasoningEngine, ReasoningEngine, ReasoningError};
