// Public modules
pub mod image_reference;
pub mod message;
pub mod model;
pub mod request;
pub mod response;

// Re-exports
pub use image_reference::{ImageMediaType, ImageReference};
pub use message::{Message, Role};
pub use model::{KnownModel, Model};
pub use request::{ChatCompletionRequest, ContentPart, ImageUrl, RequestContent, RequestMessage};
pub use response::{
    ChatCompletion, ChatCompletionChunk, Choice, ChunkChoice, ChunkDelta, GroqExtension,
    ResponseMessage, Usage,
};
