//! Core logic of the chat client: the transcript file, credentials and the
//! turn loop on top of a model provider.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod chatbot;
mod client;
pub mod credential;
mod echo;
mod error;
mod model_client;
pub mod transcript;

pub use chatbot::Chatbot;
pub use client::{ChatClient, ChatClientBuilder, DEFAULT_SYSTEM_PROMPT};
pub use credential::Credential;
pub use echo::Echo;
pub use error::Error;
pub use transcript::{Message, Role, TranscriptStore};
