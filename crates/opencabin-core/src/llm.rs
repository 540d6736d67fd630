//! Upstream LLM contract.
//!
//! The central controller that produces [`crate::routing::DomainRouting`]
//! values talks to a language model through this interface.  This workspace
//! only *consumes* the contract — concrete providers (HTTP clients, local
//! models) live in the host application.  Test suites implement it with
//! scripted doubles.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Errors surfaced by an LLM provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The provider rejected or failed the request.
    #[error("provider error: {reason}")]
    Provider { reason: String },

    /// The provider returned a response the caller could not interpret.
    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LlmError>;

/// The role of a participant in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions that shape model behavior.
    System,
    /// Input from the human user.
    User,
    /// Output from the LLM.
    Assistant,
}

/// A single message in a conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who produced this message.
    pub role: Role,
    /// The textual content of the message.
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, oldest first.
    pub messages: Vec<Message>,

    /// Sampling temperature; provider default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Response token cap; provider default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a request with provider-default sampling settings.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// A complete (non-streaming) chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant's full reply text.
    pub content: String,
}

/// An incremental chunk of a streaming chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDelta {
    /// New text appended since the previous delta.
    pub content: String,
    /// Whether this is the final delta of the response.
    pub done: bool,
}

/// Provider-agnostic chat interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run a chat completion and return the full response.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Run a chat completion as a stream of incremental deltas.
    async fn chat_stream(
        &self,
        request: ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamDelta>>>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
