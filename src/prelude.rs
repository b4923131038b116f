//! Convenience re-exports for common use.

pub use crate::assistant::{AssistantSession, RunTiming};
pub use crate::chat::ChatSession;
pub use crate::client::OpenAiClient;
pub use crate::error::{GptKitError, Result};
pub use crate::types::{ChatMessage, ResponseFormat, Role};
