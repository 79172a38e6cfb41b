use serde::{Deserialize, Serialize};

use crate::types::Role;

/// Token accounting reported by the server.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// Tokens in the request.
    #[serde(default)]
    pub prompt_tokens: u64,

    /// Tokens generated.
    #[serde(default)]
    pub completion_tokens: u64,

    /// Sum of the two.
    #[serde(default)]
    pub total_tokens: u64,
}

impl std::ops::Add for Usage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
        }
    }
}

/// The assistant message of a non-streaming choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseMessage {
    /// Always `assistant` in practice.
    pub role: Role,

    /// Generated text; absent when the model produced none.
    #[serde(default)]
    pub content: Option<String>,
}

/// One alternative of a non-streaming completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    /// Position of this choice.
    #[serde(default)]
    pub index: u32,

    /// The generated message.
    pub message: ResponseMessage,

    /// Why generation stopped (`stop`, `length`, ...).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// A complete, non-streaming reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletion {
    /// Server-assigned id.
    #[serde(default)]
    pub id: String,

    /// Model that produced the reply.
    #[serde(default)]
    pub model: String,

    /// Alternatives; chatterbox only ever uses the first.
    pub choices: Vec<Choice>,

    /// Token accounting.
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatCompletion {
    /// Text of the first choice, or the empty string.
    pub fn text(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .unwrap_or("")
    }
}

/// Incremental content of a streamed choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkDelta {
    /// Sent on the first chunk only.
    #[serde(default)]
    pub role: Option<Role>,

    /// The next fragment of text.
    #[serde(default)]
    pub content: Option<String>,
}

/// One alternative of a streamed chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkChoice {
    /// Position of this choice.
    #[serde(default)]
    pub index: u32,

    /// The fragment.
    #[serde(default)]
    pub delta: ChunkDelta,

    /// Set on the final chunk of the choice.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Groq reports streaming usage under an `x_groq` extension object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroqExtension {
    /// Usage for the whole completion, sent on the last chunk.
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One server-sent event of a streamed completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    /// Server-assigned id, shared by all chunks of a completion.
    #[serde(default)]
    pub id: String,

    /// Model that produced the chunk.
    #[serde(default)]
    pub model: String,

    /// Fragments, one per choice.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,

    /// Usage, when the server reports it at top level.
    #[serde(default)]
    pub usage: Option<Usage>,

    /// Groq-specific extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_groq: Option<GroqExtension>,
}

impl ChatCompletionChunk {
    /// A chunk carrying a single text fragment.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: Some(text.into()),
                },
                finish_reason: None,
            }],
            ..Self::default()
        }
    }

    /// The text fragment of the first choice, if non-empty.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|text| !text.is_empty())
    }

    /// Usage reported on this chunk, wherever the server put it.
    pub fn usage(&self) -> Option<Usage> {
        self.usage
            .or_else(|| self.x_groq.as_ref().and_then(|ext| ext.usage))
    }
}
