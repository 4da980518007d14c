use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

use parley_model::ErrorKind;

/// The error type for the chat client.
///
/// Construction fails fast with [`HistoryNotFound`](Error::HistoryNotFound)
/// or [`MissingCredential`](Error::MissingCredential). Every failure of the
/// remote call, whatever its cause, surfaces as
/// [`Connection`](Error::Connection).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transcript file does not exist.
    #[error("history file not found: {}", .0.display())]
    HistoryNotFound(PathBuf),

    /// No credential was given and none was found in the environment.
    #[error("missing API key: {}", credential_hint(.env_var))]
    MissingCredential {
        /// The environment variable that was consulted, if any.
        env_var: Option<String>,
    },

    /// The transcript file is not a JSON list of messages.
    #[error("malformed history file {}: {source}", .path.display())]
    MalformedHistory {
        /// Location of the transcript file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing the transcript file failed.
    #[error("failed to access history file {}: {source}", .path.display())]
    Io {
        /// Location of the transcript file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The remote call failed.
    #[error("error communicating with the model provider: {source}")]
    Connection {
        /// What the provider reported as the cause.
        kind: ErrorKind,
        /// The original provider error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    /// Returns the provider-reported cause of a connection error.
    #[inline]
    pub fn provider_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Connection { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

fn credential_hint(env_var: &Option<String>) -> String {
    match env_var {
        Some(var) => format!(
            "provide one as a parameter or through the {var} environment variable"
        ),
        None => "provide one as a parameter".to_owned(),
    }
}
