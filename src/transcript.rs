//! The ordered record of one conversation.

use crate::error::{Error, Result};
use crate::types::{Message, Role};

/// Append-only list of user and assistant turns for one session.
///
/// Entries are never edited or removed one at a time; [`Transcript::clear`] drops all of
/// them at once.  Messages with empty (or whitespace-only) content are refused.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the content is blank or the role is `system`; the
    /// system prompt is configuration, not history.
    pub fn push(&mut self, message: Message) -> Result<()> {
        if message.content.trim().is_empty() {
            return Err(Error::validation(
                "message content must not be empty",
                Some("content".to_string()),
            ));
        }
        if message.role == Role::System {
            return Err(Error::validation(
                "system messages are not part of the transcript",
                Some("role".to_string()),
            ));
        }
        self.messages.push(message);
        Ok(())
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when there are no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All messages in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The trailing `window` messages, oldest first.
    pub fn tail(&self, window: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize) -> Transcript {
        let mut transcript = Transcript::new();
        for i in 0..n {
            let message = if i % 2 == 0 {
                Message::user(format!("question {i}"))
            } else {
                Message::assistant(format!("answer {i}"))
            };
            transcript.push(message).unwrap();
        }
        transcript
    }

    #[test]
    fn append_preserves_earlier_entries() {
        let mut transcript = sample(3);
        let before: Vec<Message> = transcript.messages().to_vec();
        transcript.push(Message::assistant("more")).unwrap();
        assert_eq!(&transcript.messages()[..3], before.as_slice());
        assert_eq!(transcript.last(), Some(&Message::assistant("more")));
    }

    #[test]
    fn empty_content_refused() {
        let mut transcript = Transcript::new();
        assert!(transcript.push(Message::user("   ")).is_err());
        assert!(transcript.push(Message::assistant("")).is_err());
        assert!(transcript.is_empty());
    }

    #[test]
    fn system_role_refused() {
        let mut transcript = Transcript::new();
        assert!(transcript.push(Message::system("rules")).is_err());
        assert!(transcript.is_empty());
    }

    #[test]
    fn tail_is_ordered_suffix() {
        let transcript = sample(7);
        for window in 0..10 {
            let tail = transcript.tail(window);
            let expected = window.min(transcript.len());
            assert_eq!(tail.len(), expected);
            assert_eq!(tail, &transcript.messages()[transcript.len() - expected..]);
        }
    }

    #[test]
    fn clear_empties_regardless_of_size() {
        for n in [0, 1, 12] {
            let mut transcript = sample(n);
            transcript.clear();
            assert!(transcript.is_empty());
            assert_eq!(transcript.len(), 0);
        }
    }
}
