//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::error::Result;
use crate::imagine::DEFAULT_IMAGE_URL;
use crate::prompt::check_window;
use crate::types::{KnownModel, Model};

/// System prompt sent ahead of every request unless replaced.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful, smart AI assistant. Be concise and friendly.";

/// Default number of trailing transcript entries sent with each request.
pub const DEFAULT_WINDOW: usize = 10;

/// Default maximum tokens per response.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Command-line arguments for the chatterbox-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model used for text-only turns.
    #[arrrg(optional, "Text model (default: llama-3.1-8b-instant)", "MODEL")]
    pub model: Option<String>,

    /// Model used for turns that carry an image.
    #[arrrg(
        optional,
        "Vision model (default: meta-llama/llama-4-scout-17b-16e-instruct)",
        "MODEL"
    )]
    pub vision_model: Option<String>,

    /// System prompt to set context for the conversation.
    #[arrrg(optional, "System prompt for the conversation", "PROMPT")]
    pub system: Option<String>,

    /// Number of past messages sent with each request.
    #[arrrg(optional, "Messages of history sent per request (default: 10)", "N")]
    pub window: Option<usize>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: 1024)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Typing delay per streamed fragment.
    #[arrrg(optional, "Pause after each streamed fragment (default: 0)", "MILLIS")]
    pub delay_ms: Option<u64>,

    /// Show a cursor glyph while streaming.
    #[arrrg(flag, "Show a cursor glyph while the reply streams")]
    pub cursor: bool,

    /// Wait for the whole reply instead of streaming it.
    #[arrrg(flag, "Request complete replies instead of streams")]
    pub no_stream: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Path of the YAML secrets file.
    #[arrrg(optional, "Secrets file (default: .chatterbox/secrets.yaml)", "PATH")]
    pub secrets: Option<String>,

    /// Base URL of the completion API.
    #[arrrg(optional, "API base URL (default: https://api.groq.com/openai/v1/)", "URL")]
    pub base_url: Option<String>,

    /// Base URL of the image proxy used by /imagine.
    #[arrrg(optional, "Image proxy URL (default: https://image.pollinations.ai/prompt/)", "URL")]
    pub image_url: Option<String>,

    /// Log debug output to stderr.
    #[arrrg(flag, "Log debug output to stderr")]
    pub verbose: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Model for text-only turns.
    pub model: Model,

    /// Model for turns that carry an image.
    pub vision_model: Model,

    /// System prompt prepended to every request.  Blank means none.
    pub system_prompt: String,

    /// Trailing transcript entries sent per request.
    pub window: usize,

    /// Maximum tokens per response.
    pub max_tokens: Option<u32>,

    /// Optional sampling temperature.
    pub temperature: Option<f32>,

    /// Stream replies (true) or wait for them whole (false).
    pub stream: bool,

    /// Pause after each shown fragment.
    pub typing_delay: Duration,

    /// Whether to show a cursor glyph while streaming.
    pub cursor: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Where to read the API key from when the environment has none.
    pub secrets_path: Option<PathBuf>,

    /// Completion API base URL; `None` uses the client default.
    pub base_url: Option<String>,

    /// Image proxy base URL.
    pub image_url: String,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: llama-3.1-8b-instant, vision model: llama-4-scout
    /// - Window: 10 messages
    /// - Max tokens: 1024
    /// - Streaming on, no typing delay, no cursor, colors on
    pub fn new() -> Self {
        Self {
            model: Model::Known(KnownModel::Llama31_8bInstant),
            vision_model: Model::Known(KnownModel::Llama4Scout),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            window: DEFAULT_WINDOW,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            temperature: None,
            stream: true,
            typing_delay: Duration::ZERO,
            cursor: false,
            use_color: true,
            secrets_path: None,
            base_url: None,
            image_url: DEFAULT_IMAGE_URL.to_string(),
        }
    }

    /// Sets the text model.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the vision model.
    pub fn with_vision_model(mut self, model: Model) -> Self {
        self.vision_model = model;
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the context window.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Chooses streaming or complete replies.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Sets the per-fragment typing delay.
    pub fn with_typing_delay(mut self, delay: Duration) -> Self {
        self.typing_delay = delay;
        self
    }

    /// Shows or hides the cursor glyph.
    pub fn with_cursor(mut self, cursor: bool) -> Self {
        self.cursor = cursor;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Checks values that cannot be expressed in the types.
    pub fn validate(&self) -> Result<()> {
        check_window(self.window)?;
        Ok(())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        ChatConfig {
            model: args.model.map(Model::from).unwrap_or(defaults.model),
            vision_model: args
                .vision_model
                .map(Model::from)
                .unwrap_or(defaults.vision_model),
            system_prompt: args.system.unwrap_or(defaults.system_prompt),
            window: args.window.unwrap_or(DEFAULT_WINDOW),
            max_tokens: args.max_tokens.or(defaults.max_tokens),
            temperature: None,
            stream: !args.no_stream,
            typing_delay: Duration::from_millis(args.delay_ms.unwrap_or(0)),
            cursor: args.cursor,
            use_color: !args.no_color,
            secrets_path: args.secrets.map(PathBuf::from),
            base_url: args.base_url,
            image_url: args.image_url.unwrap_or(defaults.image_url),
        }
    }
}
