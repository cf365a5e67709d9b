pub mod client;
pub mod openai;

pub use client::{CompletionClient, CompletionResponse, Message};
pub use openai::OpenAiClient;
