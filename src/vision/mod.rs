pub mod client;
pub mod error;
pub mod types;

pub use client::{OpenAiClient, VisionTransport};
pub use error::TransportError;
pub use types::{ChatRequest, ChatResponse, ImageFormat};
