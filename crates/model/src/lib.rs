//! An abstraction layer for chat completion backends.
//!
//! This crate establishes the protocol the chat client uses to talk to a
//! completion backend, so that the client doesn't depend on any concrete
//! vendor API. A backend only has to turn a list of role-tagged messages
//! into a sequence of response events.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
