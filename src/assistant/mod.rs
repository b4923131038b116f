//! Assistant sessions: the file → assistant → thread → run workflow.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::client::OpenAiClient;
use crate::error::{GptKitError, Result};
use crate::http::{beta_headers, build_file_multipart, shared_client, status_to_error};
use crate::util::{language_instruction, strip_citations};

const DEFAULT_ASSISTANT_MODEL: &str = "gpt-4-1106-preview";
const DEFAULT_ASSISTANT_NAME: &str = "Assistant";

/// Drives the remote assistants workflow, strictly in order: register
/// knowledge files, [`build`] the assistant, [`add_message`] to open a
/// thread, [`run`], then poll [`get_status`]/[`has_finished`] until
/// [`get_latest_message`] can fetch the answer.
///
/// Remote identifiers are acquired progressively and each step's guard only
/// checks that the identifiers it needs exist; there are no backward
/// transitions.
///
/// [`build`]: AssistantSession::build
/// [`add_message`]: AssistantSession::add_message
/// [`run`]: AssistantSession::run
/// [`get_status`]: AssistantSession::get_status
/// [`has_finished`]: AssistantSession::has_finished
/// [`get_latest_message`]: AssistantSession::get_latest_message
#[derive(Debug, Clone)]
pub struct AssistantSession {
    client: OpenAiClient,
    language: String,
    model: String,
    name: String,
    file_ids: Vec<String>,
    assistant_id: Option<String>,
    thread_id: Option<String>,
    run_id: Option<String>,
}

/// Timing of a remote run, as reported by the vendor. Each field is a
/// nullable Unix timestamp; absence means the run never reached that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RunTiming {
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl AssistantSession {
    /// Create a session responding in English.
    pub fn new(client: OpenAiClient) -> Self {
        Self::with_language(client, "English")
    }

    /// Create a session responding in the given language. The language is
    /// fixed for the session's lifetime and restated on every instruction
    /// the remote side sees.
    pub fn with_language(client: OpenAiClient, language: impl Into<String>) -> Self {
        Self {
            client,
            language: language.into(),
            model: DEFAULT_ASSISTANT_MODEL.to_string(),
            name: DEFAULT_ASSISTANT_NAME.to_string(),
            file_ids: Vec::new(),
            assistant_id: None,
            thread_id: None,
            run_id: None,
        }
    }

    /// Override the assistant model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the assistant display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Upload a binary payload to the remote file store, tagged for
    /// assistant use. Returns the remote file id; call [`add_file`] to
    /// attach it to the next [`build`].
    ///
    /// [`add_file`]: AssistantSession::add_file
    /// [`build`]: AssistantSession::build
    pub async fn upload_file(&self, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            return Err(GptKitError::InvalidArgument(
                "File payload cannot be empty".to_string(),
            ));
        }

        let boundary = format!("gptkit-{}", Uuid::new_v4().simple());
        let body = build_file_multipart(&boundary, "assistants", "document", bytes);
        let url = self.client.endpoint("/files");

        debug!(size = bytes.len(), "uploading assistant file");

        let resp = shared_client()
            .post(&url)
            .headers(beta_headers(self.client.api_key()))
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let file: ObjectId = resp.json().await?;
        Ok(file.id)
    }

    /// Attach an already-uploaded file id to the pending-files list. No
    /// dedup; list order is the order sent at build time.
    pub fn add_file(&mut self, file_id: impl Into<String>) {
        self.file_ids.push(file_id.into());
    }

    /// The file ids pending for the next [`build`].
    ///
    /// [`build`]: AssistantSession::build
    pub fn files(&self) -> &[String] {
        &self.file_ids
    }

    /// Create the remote assistant from the pending files and instructions,
    /// with the language contract appended. Records and returns the
    /// assistant id.
    ///
    /// Not idempotent: calling twice allocates two distinct remote
    /// assistants, each with the file list as it stood.
    pub async fn build(&mut self, instructions: &str) -> Result<String> {
        let body = serde_json::json!({
            "name": self.name,
            "instructions": format!("{instructions}. {}", language_instruction(&self.language)),
            "tools": [{"type": "retrieval"}],
            "model": self.model,
            "file_ids": self.file_ids,
        });
        let url = self.client.endpoint("/assistants");

        debug!(files = ?self.file_ids, model = %self.model, "creating assistant");

        let assistant: ObjectId = self.post_json(&url, &body).await?;
        self.assistant_id = Some(assistant.id.clone());
        Ok(assistant.id)
    }

    /// Open a new remote thread seeded with a single user message. Records
    /// and returns the thread id.
    ///
    /// Each call creates a brand-new thread and discards the previous one's
    /// id, so earlier thread context is not carried forward.
    pub async fn add_message(&mut self, message: &str) -> Result<String> {
        let body = serde_json::json!({
            "messages": [{"role": "user", "content": message}],
        });
        let url = self.client.endpoint("/threads");

        debug!("creating thread");

        let thread: ObjectId = self.post_json(&url, &body).await?;
        self.thread_id = Some(thread.id.clone());
        Ok(thread.id)
    }

    /// Start a run binding the assistant to the thread, restating the
    /// language contract. Records and returns the run id.
    ///
    /// Fails with a configuration error, without any remote call, if either
    /// the assistant or the thread has not been created yet.
    pub async fn run(&mut self) -> Result<String> {
        let (assistant_id, thread_id) = match (&self.assistant_id, &self.thread_id) {
            (Some(a), Some(t)) => (a.clone(), t.clone()),
            _ => {
                return Err(GptKitError::Configuration(
                    "Assistant and/or thread not configured".to_string(),
                ))
            }
        };

        let body = serde_json::json!({
            "assistant_id": assistant_id,
            "instructions": language_instruction(&self.language),
        });
        let url = self.client.endpoint(&format!("/threads/{thread_id}/runs"));

        debug!(%assistant_id, %thread_id, "starting run");

        let run: ObjectId = self.post_json(&url, &body).await?;
        self.run_id = Some(run.id.clone());
        Ok(run.id)
    }

    /// Fetch the run's timing as reported by the remote resource.
    ///
    /// Fails with an invalid-state error if no run has been started.
    pub async fn get_status(&self) -> Result<RunTiming> {
        let (thread_id, run_id) = match (&self.thread_id, &self.run_id) {
            (Some(t), Some(r)) => (t, r),
            _ => {
                return Err(GptKitError::InvalidState(
                    "Run not started yet".to_string(),
                ))
            }
        };

        let url = self
            .client
            .endpoint(&format!("/threads/{thread_id}/runs/{run_id}"));

        let resp = shared_client()
            .get(&url)
            .headers(beta_headers(self.client.api_key()))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        Ok(resp.json().await?)
    }

    /// Whether the run has a completion timestamp.
    ///
    /// Only `completed_at` is consulted: a run the remote side cancelled or
    /// expired never completes, so it reports not-finished indefinitely.
    /// Callers polling in a loop should also inspect [`get_status`] to
    /// notice dead runs.
    ///
    /// [`get_status`]: AssistantSession::get_status
    pub async fn has_finished(&self) -> Result<bool> {
        Ok(self.get_status().await?.completed_at.is_some())
    }

    /// Fetch the newest thread message, extract its first text block, and
    /// strip embedded `【...】` citation markers.
    ///
    /// Fails with an invalid-state error until the run reports completion.
    pub async fn get_latest_message(&self) -> Result<String> {
        if !self.has_finished().await? {
            return Err(GptKitError::InvalidState(
                "Run not finished yet".to_string(),
            ));
        }

        // has_finished above guarantees a thread exists.
        let thread_id = self.thread_id.as_deref().unwrap_or_default();
        let url = self.client.endpoint(&format!("/threads/{thread_id}/messages"));

        let resp = shared_client()
            .get(&url)
            .headers(beta_headers(self.client.api_key()))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let messages: ThreadMessageList = resp.json().await?;
        debug!(%thread_id, count = messages.data.len(), "fetched thread messages");

        // The vendor lists messages newest-first.
        let latest = messages
            .data
            .into_iter()
            .next()
            .ok_or_else(|| GptKitError::api(200, "Thread has no messages"))?;
        let text = latest
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| GptKitError::api(200, "Thread message has no text content"))?;

        Ok(strip_citations(&text.value))
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let resp = shared_client()
            .post(url)
            .headers(beta_headers(self.client.api_key()))
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        Ok(resp.json().await?)
    }
}

// Wire types (internal)

#[derive(Deserialize)]
struct ObjectId {
    id: String,
}

#[derive(Deserialize)]
struct ThreadMessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
struct ThreadMessage {
    content: Vec<MessageContentBlock>,
}

#[derive(Deserialize)]
struct MessageContentBlock {
    text: Option<MessageText>,
}

#[derive(Deserialize)]
struct MessageText {
    value: String,
}
