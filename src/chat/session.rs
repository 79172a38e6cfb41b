//! Chat session management.
//!
//! This module provides the core session type that owns the transcript, assembles each
//! request, and drives a reply through a [`Renderer`].

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::chat::config::{ChatConfig, DEFAULT_SYSTEM_PROMPT};
use crate::client::{ChunkStream, Completer, TokenStream, text_fragments};
use crate::error::{Error, Result};
use crate::observability::{SESSION_RESETS, SESSION_TURN_FAILURES, SESSION_TURNS};
use crate::prompt::{assemble, check_window, live_turn_has_image};
use crate::render::Renderer;
use crate::stream::{RenderOptions, render_stream};
use crate::transcript::Transcript;
use crate::types::{ChatCompletionRequest, ImageReference, Message, Model, Usage};

/// Where a session is within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Waiting for user input.
    Idle,
    /// A request is in flight and nothing has arrived yet.
    AwaitingResponse,
    /// Fragments are being shown.
    Streaming,
}

/// The result of a successful turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// The model that answered.
    pub model: Model,
    /// The committed assistant text.
    pub text: String,
    /// Token accounting, when the server reported it.
    pub usage: Option<Usage>,
}

/// Statistics about the current chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// The model used for text-only turns.
    pub model: Model,
    /// The model used for turns with an image.
    pub vision_model: Model,
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// How many trailing messages are sent per request.
    pub window: usize,
    /// The system prompt; empty when none is sent.
    pub system_prompt: String,
    /// Whether replies are streamed.
    pub stream: bool,
    /// Pause after each shown fragment.
    pub typing_delay: Duration,
    /// Whether the streaming cursor is shown.
    pub cursor: bool,
    /// Whether an image waits to be sent with the next message.
    pub image_attached: bool,
    /// Turns that committed a reply.
    pub completed_turns: u64,
    /// Turns that ended in an error.
    pub failed_turns: u64,
    /// Tokens reported across all answered turns.
    pub total_usage: Usage,
    /// Tokens reported for the last answered turn.
    pub last_turn_usage: Option<Usage>,
}

/// A chat session that maintains conversation state.
///
/// Turns are strictly sequential: [`ChatSession::submit`] takes `&mut self` and does not
/// return until the reply has been shown or has failed.
pub struct ChatSession<C: Completer> {
    completer: C,
    config: ChatConfig,
    transcript: Transcript,
    pending_image: Option<ImageReference>,
    state: TurnState,
    completed_turns: u64,
    failed_turns: u64,
    total_usage: Usage,
    last_turn_usage: Option<Usage>,
}

impl<C: Completer> ChatSession<C> {
    /// Creates a new chat session.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the configuration is unusable.
    pub fn new(completer: C, config: ChatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            completer,
            config,
            transcript: Transcript::new(),
            pending_image: None,
            state: TurnState::Idle,
            completed_turns: 0,
            failed_turns: 0,
            total_usage: Usage::default(),
            last_turn_usage: None,
        })
    }

    /// Sends a user message and shows the reply.
    ///
    /// This method:
    /// 1. Appends the user message (with any attached image) to the transcript
    /// 2. Sends the system prompt and the last `window` messages
    /// 3. Renders fragments as they arrive
    /// 4. Appends the complete assistant reply to the transcript
    ///
    /// On failure the error and any hint are shown through `renderer` in place of the
    /// reply, no assistant message is added, and the session returns to
    /// [`TurnState::Idle`] so the user can resubmit.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank prompt, otherwise whatever error ended
    /// the turn.
    pub async fn submit(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnOutcome> {
        let user_input = user_input.trim();
        if user_input.is_empty() {
            return Err(Error::validation(
                "message must not be empty",
                Some("content".to_string()),
            ));
        }

        let mut message = Message::user(user_input);
        if let Some(image) = self.pending_image.take() {
            message = message.with_image(image);
        }
        self.transcript.push(message)?;
        SESSION_TURNS.click();

        let outcome = self.take_turn(renderer).await;
        self.enter(TurnState::Idle, renderer);

        match outcome {
            Ok(outcome) => {
                self.transcript.push(Message::assistant(outcome.text.clone()))?;
                self.completed_turns += 1;
                if let Some(usage) = outcome.usage {
                    self.total_usage = self.total_usage + usage;
                }
                self.last_turn_usage = outcome.usage;
                Ok(outcome)
            }
            Err(err) => {
                SESSION_TURN_FAILURES.click();
                self.failed_turns += 1;
                tracing::warn!(kind = ?err.kind(), error = %err, "turn failed");
                renderer.print_error(&err.to_string());
                if let Some(hint) = err.hint() {
                    renderer.print_hint(hint);
                }
                Err(err)
            }
        }
    }

    async fn take_turn(&mut self, renderer: &mut dyn Renderer) -> Result<TurnOutcome> {
        let model = if live_turn_has_image(&self.transcript) {
            self.config.vision_model.clone()
        } else {
            self.config.model.clone()
        };
        let messages = assemble(
            &self.config.system_prompt,
            &self.transcript,
            self.config.window,
        );
        tracing::debug!(model = %model, messages = messages.len(), "sending turn");
        let request = ChatCompletionRequest::new(model.clone(), messages)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);

        self.enter(TurnState::AwaitingResponse, renderer);
        let reported = Arc::new(Mutex::new(None));
        let fragments: TokenStream = if self.config.stream {
            let chunks = self.completer.stream(request).await?;
            text_fragments(record_usage(chunks, Arc::clone(&reported)))
        } else {
            let completion = self.completer.complete(request).await?;
            if let Ok(mut slot) = reported.lock() {
                *slot = completion.usage;
            }
            let text = completion.text().to_string();
            let fragments = if text.is_empty() { vec![] } else { vec![Ok(text)] };
            Box::pin(stream::iter(fragments))
        };

        self.enter(TurnState::Streaming, renderer);
        renderer.start_response(&model.to_string());
        let options = RenderOptions::with_delay(self.config.typing_delay);
        let text = render_stream(fragments, renderer, options).await?;
        if text.trim().is_empty() {
            return Err(Error::streaming("the model returned an empty reply", None));
        }
        let usage = reported.lock().ok().and_then(|slot| *slot);
        Ok(TurnOutcome { model, text, usage })
    }

    fn enter(&mut self, state: TurnState, renderer: &mut dyn Renderer) {
        self.state = state;
        renderer.turn_state(state);
    }

    /// Starts a new conversation, dropping any attached image.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.pending_image = None;
        SESSION_RESETS.click();
    }

    /// Returns the conversation so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    /// Returns where the session is within a turn.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Attaches an image to the next user message, replacing any earlier one.
    pub fn attach_image(&mut self, image: ImageReference) {
        self.pending_image = Some(image);
    }

    /// Reads an image file and attaches it to the next user message.
    pub fn attach_image_path<P: AsRef<Path>>(&mut self, path: P) -> Result<&ImageReference> {
        let image = ImageReference::from_path(path)?;
        Ok(self.pending_image.insert(image))
    }

    /// Drops the attached image.  Returns true if there was one.
    pub fn detach_image(&mut self) -> bool {
        self.pending_image.take().is_some()
    }

    /// Returns the image waiting for the next message, if any.
    pub fn pending_image(&self) -> Option<&ImageReference> {
        self.pending_image.as_ref()
    }

    /// Changes the text model.
    pub fn set_model(&mut self, model: Model) {
        self.config.model = model;
    }

    /// Changes the vision model.
    pub fn set_vision_model(&mut self, model: Model) {
        self.config.vision_model = model;
    }

    /// Sets the system prompt; `None` restores the default.
    pub fn set_system_prompt(&mut self, prompt: Option<String>) {
        self.config.system_prompt = prompt.unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
    }

    /// Sets how many past messages are sent per request.
    pub fn set_window(&mut self, window: usize) -> Result<()> {
        self.config.window = check_window(window)?;
        Ok(())
    }

    /// Sets the typing delay.
    pub fn set_typing_delay(&mut self, delay: Duration) {
        self.config.typing_delay = delay;
    }

    /// Chooses streamed or whole replies.
    pub fn set_stream(&mut self, stream: bool) {
        self.config.stream = stream;
    }

    /// Records whether the streaming cursor is shown.
    pub fn set_cursor(&mut self, cursor: bool) {
        self.config.cursor = cursor;
    }

    /// Returns session statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.config.model.clone(),
            vision_model: self.config.vision_model.clone(),
            message_count: self.message_count(),
            window: self.config.window,
            system_prompt: self.config.system_prompt.clone(),
            stream: self.config.stream,
            typing_delay: self.config.typing_delay,
            cursor: self.config.cursor,
            image_attached: self.pending_image.is_some(),
            completed_turns: self.completed_turns,
            failed_turns: self.failed_turns,
            total_usage: self.total_usage,
            last_turn_usage: self.last_turn_usage,
        }
    }

    /// Sets the sampling temperature; `None` leaves it to the server.
    pub fn set_temperature(&mut self, temperature: Option<f32>) {
        self.config.temperature = temperature;
    }
}

/// Pass `chunks` through, keeping the last usage report seen in `slot`.
fn record_usage(chunks: ChunkStream, slot: Arc<Mutex<Option<Usage>>>) -> ChunkStream {
    Box::pin(chunks.inspect(move |chunk| {
        if let Ok(chunk) = chunk
            && let Some(usage) = chunk.usage()
            && let Ok(mut slot) = slot.lock()
        {
            *slot = Some(usage);
        }
    }))
}
