//! Gptkit — thin Rust client for the OpenAI chat and assistants APIs.
//!
//! Two session abstractions over the vendor HTTP API: [`chat::ChatSession`]
//! accumulates a conversation and requests a single completion, while
//! [`assistant::AssistantSession`] drives the multi-step assistants workflow
//! (upload files, create an assistant, create a thread, start a run, poll it,
//! fetch the answer).
//!
//! # Quick Start
//!
//! ```no_run
//! use gptkit::prelude::*;
//!
//! # async fn example() -> gptkit::error::Result<()> {
//! let client = OpenAiClient::from_env()?;
//! let mut chat = ChatSession::new(client);
//! chat.add_message(Role::User, "Hello!");
//! let answer = chat.request_completion().await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod assistant;
pub mod chat;
pub mod client;
pub mod error;
pub mod http;
pub mod prelude;
pub mod types;
pub mod util;
