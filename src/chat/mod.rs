//! Single-shot chat completion sessions.

use serde::Deserialize;
use tracing::debug;

use crate::client::OpenAiClient;
use crate::error::{GptKitError, Result};
use crate::http::{bearer_headers, shared_client, status_to_error};
use crate::types::{ChatMessage, ResponseFormat, Role};
use crate::util::language_instruction;

const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo-1106";

/// An ordered conversation plus the knobs baked into every completion
/// request: model, response format, and the response-language contract.
///
/// Construction seeds exactly one system message establishing the language
/// contract; everything after that is appended via [`add_message`].
///
/// [`add_message`]: ChatSession::add_message
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: OpenAiClient,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    model: String,
}

impl ChatSession {
    /// Create a session responding in English.
    pub fn new(client: OpenAiClient) -> Self {
        Self::with_language(client, "English")
    }

    /// Create a session responding in the given language. The language is
    /// fixed for the session's lifetime.
    pub fn with_language(client: OpenAiClient, language: impl AsRef<str>) -> Self {
        Self {
            client,
            messages: vec![ChatMessage::system(language_instruction(language.as_ref()))],
            response_format: ResponseFormat::Text,
            model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }

    /// Request strict-JSON responses instead of free text.
    pub fn json_response(mut self) -> Self {
        self.response_format = ResponseFormat::JsonObject;
        self
    }

    /// Override the completion model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Append a message. Messages are never removed or reordered.
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
        });
    }

    /// The accumulated conversation, in insertion order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send the full conversation and return the top choice's text.
    ///
    /// Transport and vendor failures propagate untouched; nothing is
    /// retried or caught here.
    pub async fn request_completion(&self) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "response_format": self.response_format,
            "messages": self.messages,
        });
        let url = self.client.endpoint("/chat/completions");

        debug!(model = %self.model, messages = self.messages.len(), "requesting chat completion");

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(self.client.api_key()))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: ChatCompletionResponse = resp.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GptKitError::api(200, "No choices in completion response"))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

// Wire types (internal)

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ChatSession {
        ChatSession::new(OpenAiClient::new("sk-test").unwrap())
    }

    #[test]
    fn new_session_holds_exactly_the_seed_message() {
        let chat = session();
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].role, Role::System);
        assert_eq!(
            chat.messages()[0].content,
            "Please return the response in English"
        );
    }

    #[test]
    fn seed_message_uses_session_language() {
        let chat = ChatSession::with_language(OpenAiClient::new("sk-test").unwrap(), "Spanish");
        assert_eq!(
            chat.messages()[0].content,
            "Please return the response in Spanish"
        );
    }

    #[test]
    fn add_message_appends_in_order() {
        let mut chat = session();
        chat.add_message(Role::User, "first");
        chat.add_message(Role::Assistant, "second");
        assert_eq!(chat.messages().len(), 3);
        assert_eq!(chat.messages()[1].content, "first");
        assert_eq!(chat.messages()[2].content, "second");
    }
}
