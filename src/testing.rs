//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures::stream;

use crate::chat::TurnState;
use crate::client::{ChunkStream, Completer};
use crate::error::{Error, Result};
use crate::render::Renderer;
use crate::types::{
    ChatCompletion, ChatCompletionChunk, ChatCompletionRequest, Choice, ResponseMessage, Role,
    Usage,
};

/// Records everything a session shows.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub states: Vec<TurnState>,
    pub started: Vec<String>,
    pub partials: Vec<String>,
    pub finished: Vec<String>,
    pub errors: Vec<String>,
    pub hints: Vec<String>,
    pub infos: Vec<String>,
}

impl Renderer for RecordingRenderer {
    fn turn_state(&mut self, state: TurnState) {
        self.states.push(state);
    }

    fn start_response(&mut self, model: &str) {
        self.started.push(model.to_string());
    }

    fn show_partial(&mut self, buffer: &str, _fragment: &str) {
        self.partials.push(buffer.to_string());
    }

    fn finish_response(&mut self, text: &str) {
        self.finished.push(text.to_string());
    }

    fn print_error(&mut self, error: &str) {
        self.errors.push(error.to_string());
    }

    fn print_hint(&mut self, hint: &str) {
        self.hints.push(hint.to_string());
    }

    fn print_info(&mut self, info: &str) {
        self.infos.push(info.to_string());
    }
}

/// One scripted reply.
pub enum Reply {
    /// Stream these fragments (an `Err` item breaks the stream there).
    Stream(Vec<Result<String>>),
    /// Stream these chunks as they are, usage and all.
    Chunks(Vec<Result<ChatCompletionChunk>>),
    /// Fail before any fragment is produced.
    Fail(Error),
}

/// A completer that plays back replies in order and records the requests it saw.
#[derive(Default)]
pub struct ScriptedCompleter {
    replies: Mutex<VecDeque<Reply>>,
    pub requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedCompleter {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn streaming(fragments: &[&str]) -> Self {
        Self::new([Reply::Stream(
            fragments.iter().map(|f| Ok(f.to_string())).collect(),
        )])
    }

    pub fn failing(err: Error) -> Self {
        Self::new([Reply::Fail(err)])
    }

    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn next(&self, request: ChatCompletionRequest) -> Reply {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Fail(Error::unknown("no scripted reply left")))
    }
}

#[async_trait::async_trait]
impl Completer for ScriptedCompleter {
    async fn complete(&self, request: ChatCompletionRequest) -> Result<ChatCompletion> {
        match self.next(request) {
            Reply::Fail(err) => Err(err),
            Reply::Stream(fragments) => {
                let text = fragments.into_iter().collect::<Result<Vec<String>>>()?.concat();
                Ok(completion(text, None))
            }
            Reply::Chunks(chunks) => {
                let chunks = chunks.into_iter().collect::<Result<Vec<_>>>()?;
                let text: String = chunks.iter().filter_map(|c| c.text()).collect();
                let usage = chunks.iter().rev().find_map(|c| c.usage());
                Ok(completion(text, usage))
            }
        }
    }

    async fn stream(&self, request: ChatCompletionRequest) -> Result<ChunkStream> {
        match self.next(request) {
            Reply::Fail(err) => Err(err),
            Reply::Stream(fragments) => {
                let chunks: Vec<Result<ChatCompletionChunk>> = fragments
                    .into_iter()
                    .map(|f| f.map(ChatCompletionChunk::from_text))
                    .collect();
                Ok(Box::pin(stream::iter(chunks)))
            }
            Reply::Chunks(chunks) => Ok(Box::pin(stream::iter(chunks))),
        }
    }
}

fn completion(text: String, usage: Option<Usage>) -> ChatCompletion {
    ChatCompletion {
        id: "scripted".to_string(),
        model: String::new(),
        choices: vec![Choice {
            index: 0,
            message: ResponseMessage {
                role: Role::Assistant,
                content: Some(text),
            },
            finish_reason: Some("stop".to_string()),
        }],
        usage,
    }
}
