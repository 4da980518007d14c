//! An out-of-the-box chatbot backed by an OpenAI-compatible endpoint.
//!
//! The crate includes a CLI tool for chatting in the terminal. And you can
//! also use it as a library, see [`OpenAIChatbotBuilder`].

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

mod chatbot;

pub use chatbot::{OpenAIChatbot, OpenAIChatbotBuilder};

/// Re-exports of [`parley_core`] crate.
pub mod core {
    pub use parley_core::*;
}

/// Re-exports of [`parley_model`] crate.
pub mod model {
    pub use parley_model::*;
}
