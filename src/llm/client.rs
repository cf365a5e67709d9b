//! `CompletionClient` trait — abstraction over completion backends.
//!
//! Providers implement this trait so the engine can be configured to
//! use any supported backend via the `[llm] provider` config field,
//! and so tests can substitute a scripted double.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One message in a completion conversation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    /// Convenience constructor for a `role: "user"` message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Completion response with usage metadata.
#[derive(Debug)]
pub struct CompletionResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Abstraction over hosted completion services.
///
/// The engine treats the service as an opaque function
/// `messages -> first_choice_text`; transport, auth, and any retry
/// behavior belong to the implementation, never to the engine.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends a message list to the completion service and returns the
    /// text of the first choice. Network and service errors propagate
    /// unmodified.
    async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse>;

    /// Human-readable description of the provider and model.
    ///
    /// Used in status output, e.g. `"openai (gpt-4o-mini)"`.
    fn description(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time verification that `CompletionClient` is object-safe.
    #[test]
    fn test_completion_client_is_object_safe() {
        fn _assert_object_safe(_: &dyn CompletionClient) {}
    }

    #[test]
    fn test_user_message_constructor() {
        let msg = Message::user("hello");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content, "hello");
    }
}
