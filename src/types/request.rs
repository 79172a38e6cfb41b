use serde::{Deserialize, Serialize};

use crate::types::{Message, Model, Role};

/// The content of a request message: plain text, or a list of typed parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RequestContent {
    /// A simple string content.
    Text(String),

    /// Text plus image parts.
    Parts(Vec<ContentPart>),
}

/// One part of a multi-part message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// A text part.
    Text {
        /// The text.
        text: String,
    },

    /// An image part, referenced by URL (usually a `data:` URL).
    ImageUrl {
        /// The image location.
        image_url: ImageUrl,
    },
}

/// The `image_url` object of an image part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    /// An `https:` or `data:` URL.
    pub url: String,
}

/// A message as sent to the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestMessage {
    /// The role of the message.
    pub role: Role,

    /// The content of the message.
    pub content: RequestContent,
}

impl RequestMessage {
    /// A text-only request message.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: RequestContent::Text(text.into()),
        }
    }

    /// Build the wire form of a transcript message.
    ///
    /// When `include_image` is false any attached image is dropped and only the text is
    /// sent.
    pub fn from_message(message: &Message, include_image: bool) -> Self {
        match (&message.image, include_image) {
            (Some(image), true) => Self {
                role: message.role,
                content: RequestContent::Parts(vec![
                    ContentPart::Text {
                        text: message.content.clone(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.to_data_url(),
                        },
                    },
                ]),
            },
            _ => Self::text(message.role, message.content.clone()),
        }
    }

    /// Returns true when any part of this message is an image.
    pub fn has_image(&self) -> bool {
        match &self.content {
            RequestContent::Text(_) => false,
            RequestContent::Parts(parts) => parts
                .iter()
                .any(|part| matches!(part, ContentPart::ImageUrl { .. })),
        }
    }

    /// The text of this message, concatenating text parts.
    pub fn text_content(&self) -> String {
        match &self.content {
            RequestContent::Text(text) => text.clone(),
            RequestContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect(),
        }
    }
}

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// Model to run the completion on.
    pub model: Model,

    /// System message followed by the conversation window.
    pub messages: Vec<RequestMessage>,

    /// Whether to stream the reply as server-sent events.
    #[serde(default)]
    pub stream: bool,

    /// Upper bound on generated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatCompletionRequest {
    /// Create a non-streaming request.
    pub fn new(model: Model, messages: Vec<RequestMessage>) -> Self {
        Self {
            model,
            messages,
            stream: false,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Set whether the reply streams.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set the maximum tokens.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}
