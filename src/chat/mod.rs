//! Interactive chat on top of the chatterbox client library.
//!
//! This module provides a streaming REPL chat interface. It supports:
//!
//! - Streaming responses with an optional typing delay and cursor
//! - Images attached to a message, answered by a vision model
//! - Slash commands for session control
//! - Configurable models, system prompt, and context window
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Core chat session management and API interaction
//! - [`commands`]: Slash command parsing

mod commands;
mod config;
mod session;

pub use crate::render::{DEFAULT_CURSOR, PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_SYSTEM_PROMPT, DEFAULT_WINDOW};
pub use session::{ChatSession, SessionStats, TurnOutcome, TurnState};
