// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod imagine;
pub mod observability;
pub mod prompt;
pub mod render;
pub mod secrets;
pub mod sse;
pub mod stream;
pub mod transcript;
pub mod types;

#[cfg(test)]
mod testing;

// Re-exports
pub use client::{ChatClient, ChunkStream, Completer, DEFAULT_API_URL, TokenStream, text_fragments};
pub use error::{Error, ErrorKind, Result};
pub use imagine::{DEFAULT_IMAGE_URL, ImageLinker};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use secrets::{API_KEY_ENV, Secrets, resolve_api_key};
pub use stream::{RenderOptions, render_stream};
pub use transcript::Transcript;
pub use types::*;
