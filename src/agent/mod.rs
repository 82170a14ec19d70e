//! Conversational assistant integration.
//!
//! The assistant manages categories by replying with prose plus a fenced
//! `actions` block holding a JSON array of tagged commands. This module
//! extracts and types those commands ([`commands`]), applies them as an
//! ordered batch against the category model ([`executor`]), builds the
//! system prompt from live state ([`prompt`]), and carries the chat
//! transport ([`client`]).

mod client;
mod commands;
mod executor;
mod prompt;

pub use client::{AgentClient, AgentError, ChatMessage};
pub use commands::{extract_actions, extract_explanation, AgentCommand};
pub use executor::execute;
pub use prompt::build_system_prompt;
