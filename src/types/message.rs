use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ImageReference;

/// Who authored a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The fixed instructions prepended to every request.
    System,

    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn of a conversation.
///
/// Messages are values: once one has been appended to a
/// [`Transcript`](crate::Transcript) it is only ever handed out by shared reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// The role of the author.
    pub role: Role,

    /// The text of the message.
    pub content: String,

    /// An image attached to the message, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<ImageReference>,
}

impl Message {
    /// Create a new text-only message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            image: None,
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Attach an image to this message.
    pub fn with_image(mut self, image: ImageReference) -> Self {
        self.image = Some(image);
        self
    }

    /// Returns true when the message carries an image.
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageMediaType;
    use serde_json::{json, to_value};

    #[test]
    fn constructors_set_role() {
        assert_eq!(Message::user("Hello").role, Role::User);
        assert_eq!(Message::assistant("Hi").role, Role::Assistant);
        assert_eq!(Message::system("Be brief").role, Role::System);
    }

    #[test]
    fn text_message_serializes_without_image() {
        let json = to_value(Message::user("Hello")).unwrap();
        assert_eq!(json, json!({"role": "user", "content": "Hello"}));
    }

    #[test]
    fn image_is_attached() {
        let image = ImageReference::from_bytes(b"x", ImageMediaType::Gif);
        let message = Message::user("What is this?").with_image(image.clone());
        assert!(message.has_image());
        assert_eq!(message.image, Some(image));
    }
}
