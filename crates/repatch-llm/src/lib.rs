//! Model conversation capability: provider trait, the Anthropic Messages
//! implementation, the model-facing tool schema, and the usage/cost ledger.

pub mod anthropic;
pub mod provider;
pub mod usage;

pub use anthropic::AnthropicProvider;
pub use provider::{tool_definitions, Message, ModelProvider, ModelTurn};
pub use usage::{CostTracker, UsageLedger};
