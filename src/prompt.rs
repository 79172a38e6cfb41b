//! Builds the message list sent with each turn.
//!
//! A request is the system prompt followed by the last `window` transcript entries, in
//! the order they were appended.  Only the live turn (the newest entry, when it was
//! written by the user) may carry its image; older image-bearing entries are sent as
//! their text alone so that image data is uploaded exactly once.

use crate::error::{Error, Result};
use crate::transcript::Transcript;
use crate::types::{RequestMessage, Role};

/// Smallest accepted context window.
pub const MIN_WINDOW: usize = 1;

/// Validates a context window size.
pub fn check_window(window: usize) -> Result<usize> {
    if window < MIN_WINDOW {
        return Err(Error::validation(
            format!("context window must be at least {MIN_WINDOW}"),
            Some("window".to_string()),
        ));
    }
    Ok(window)
}

/// Returns true if the entry at `index` is the live turn of `transcript`.
pub fn is_live_turn(transcript: &Transcript, index: usize) -> bool {
    index + 1 == transcript.len()
        && transcript
            .last()
            .is_some_and(|message| message.role == Role::User)
}

/// Returns true if the live turn carries an image.
pub fn live_turn_has_image(transcript: &Transcript) -> bool {
    transcript
        .last()
        .is_some_and(|message| message.role == Role::User && message.has_image())
}

/// Assemble `[system] + last min(window, len) entries` for one request.
///
/// A blank `system_prompt` is omitted.
pub fn assemble(system_prompt: &str, transcript: &Transcript, window: usize) -> Vec<RequestMessage> {
    let tail = transcript.tail(window);
    let offset = transcript.len() - tail.len();

    let mut messages = Vec::with_capacity(tail.len() + 1);
    if !system_prompt.trim().is_empty() {
        messages.push(RequestMessage::text(Role::System, system_prompt));
    }
    messages.extend(
        tail.iter()
            .enumerate()
            .map(|(i, message)| RequestMessage::from_message(message, is_live_turn(transcript, offset + i))),
    );
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImageMediaType, ImageReference, Message, RequestContent};

    const SYSTEM: &str = "You are a helpful, smart AI assistant. Be concise and friendly.";

    fn image() -> ImageReference {
        ImageReference::from_bytes(b"pixels", ImageMediaType::Png)
    }

    fn transcript(n: usize) -> Transcript {
        let mut transcript = Transcript::new();
        for i in 0..n {
            let message = if i % 2 == 0 {
                Message::user(format!("u{i}"))
            } else {
                Message::assistant(format!("a{i}"))
            };
            transcript.push(message).unwrap();
        }
        transcript
    }

    #[test]
    fn history_is_last_k_in_order() {
        for len in 0..12 {
            let transcript = transcript(len);
            for window in 1..12 {
                let messages = assemble(SYSTEM, &transcript, window);
                assert_eq!(messages[0], RequestMessage::text(Role::System, SYSTEM));
                let history = &messages[1..];
                let expected: Vec<RequestMessage> = transcript
                    .tail(window)
                    .iter()
                    .map(|m| RequestMessage::text(m.role, m.content.clone()))
                    .collect();
                assert_eq!(history.len(), window.min(len));
                assert_eq!(history, expected.as_slice());
            }
        }
    }

    #[test]
    fn blank_system_prompt_is_omitted() {
        let transcript = transcript(2);
        let messages = assemble("  ", &transcript, 10);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
    }

    #[test]
    fn live_turn_keeps_image() {
        let mut transcript = transcript(2);
        transcript
            .push(Message::user("what is this?").with_image(image()))
            .unwrap();
        assert!(live_turn_has_image(&transcript));
        let messages = assemble(SYSTEM, &transcript, 10);
        let live = messages.last().unwrap();
        assert!(live.has_image());
        assert!(matches!(live.content, RequestContent::Parts(ref parts) if parts.len() == 2));
    }

    #[test]
    fn historical_images_are_not_resent() {
        let mut transcript = Transcript::new();
        transcript
            .push(Message::user("what is this?").with_image(image()))
            .unwrap();
        transcript.push(Message::assistant("a cat")).unwrap();
        transcript.push(Message::user("what colour?")).unwrap();
        assert!(!live_turn_has_image(&transcript));

        let messages = assemble(SYSTEM, &transcript, 10);
        assert_eq!(messages.len(), 4);
        assert!(messages.iter().all(|m| !m.has_image()));
        assert_eq!(messages[1].text_content(), "what is this?");
    }

    #[test]
    fn assistant_last_is_not_live() {
        let mut transcript = Transcript::new();
        transcript
            .push(Message::user("look").with_image(image()))
            .unwrap();
        transcript.push(Message::assistant("ok")).unwrap();
        assert!(!is_live_turn(&transcript, 1));
        assert!(!live_turn_has_image(&transcript));
    }

    #[test]
    fn zero_window_rejected() {
        assert!(check_window(0).is_err());
        assert_eq!(check_window(5).unwrap(), 5);
    }
}
