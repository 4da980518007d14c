//! The persisted conversation transcript.

use std::fs;
use std::io::{self, ErrorKind as IoErrorKind};
use std::path::{Path, PathBuf};

use parley_model::ModelMessage;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Who produced a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// User input.
    User,
    /// Model output.
    Assistant,
}

/// A role-tagged message in the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Who produced this message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl Message {
    /// Creates a system message.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Message> for ModelMessage {
    fn from(msg: &Message) -> Self {
        let content = msg.content.clone();
        match msg.role {
            Role::System => ModelMessage::System(content),
            Role::User => ModelMessage::User(content),
            Role::Assistant => ModelMessage::Assistant(content),
        }
    }
}

/// A transcript file holding a pretty-printed JSON list of [`Message`].
///
/// The whole list is rewritten on every save. Writes are not atomic, and
/// nothing guards against two stores pointing at the same file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptStore {
    path: PathBuf,
}

impl TranscriptStore {
    /// Opens an existing transcript file.
    ///
    /// Only existence is checked here, the content is parsed by
    /// [`load`](Self::load).
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, Error> {
        let path = path.into();
        if !path.exists() {
            return Err(Error::HistoryNotFound(path));
        }
        Ok(Self { path })
    }

    /// Opens a transcript file, creating it with an empty list first if it
    /// doesn't exist.
    pub fn create<P: Into<PathBuf>>(path: P) -> Result<Self, Error> {
        let path = path.into();
        match fs::OpenOptions::new().write(true).create_new(true).open(&path)
        {
            Ok(_) => {
                debug!(path = %path.display(), "created empty history file");
                let store = Self { path };
                store.save(&[])?;
                Ok(store)
            }
            Err(err) if err.kind() == IoErrorKind::AlreadyExists => {
                Ok(Self { path })
            }
            Err(source) => Err(Error::Io { path, source }),
        }
    }

    /// Returns the location of the transcript file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the whole transcript.
    pub fn load(&self) -> Result<Vec<Message>, Error> {
        let content = fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == IoErrorKind::NotFound {
                Error::HistoryNotFound(self.path.clone())
            } else {
                self.io_error(source)
            }
        })?;
        let messages: Vec<Message> =
            serde_json::from_str(&content).map_err(|source| {
                Error::MalformedHistory {
                    path: self.path.clone(),
                    source,
                }
            })?;
        debug!(
            path = %self.path.display(),
            messages = messages.len(),
            "loaded history"
        );
        Ok(messages)
    }

    /// Overwrites the transcript file with `messages`.
    pub fn save(&self, messages: &[Message]) -> Result<(), Error> {
        // `serde_json` writes non-ASCII text as is, without `\u` escapes.
        let mut content = serde_json::to_string_pretty(messages)
            .map_err(|err| self.io_error(io::Error::other(err)))?;
        content.push('\n');
        fs::write(&self.path, content).map_err(|source| self.io_error(source))?;
        debug!(
            path = %self.path.display(),
            messages = messages.len(),
            "saved history"
        );
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> Error {
        Error::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn store_with(content: &str) -> (TempDir, TranscriptStore) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, content).unwrap();
        let store = TranscriptStore::open(path).unwrap();
        (dir, store)
    }

    #[test]
    fn test_round_trip() {
        let (_dir, store) = store_with("[]");
        let messages = vec![
            Message::system("You are skilled in translating English to Chinese."),
            Message::user("Hello, how are you?"),
            Message::assistant("你好，你好吗？😀"),
            Message::user("Line one\nline \"two\"\ttabbed"),
        ];
        store.save(&messages).unwrap();
        assert_eq!(store.load().unwrap(), messages);
    }

    #[test]
    fn test_saved_format() {
        let (_dir, store) = store_with("[]");
        store
            .save(&[Message::user("Hello"), Message::assistant("你好")])
            .unwrap();
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            content,
            "[\n  {\n    \"role\": \"user\",\n    \"content\": \"Hello\"\n  },\n  {\n    \"role\": \"assistant\",\n    \"content\": \"你好\"\n  }\n]\n"
        );
    }

    #[test]
    fn test_load_empty_list() {
        let (_dir, store) = store_with("[]");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_invalid_json() {
        let (_dir, store) = store_with("invalid json");
        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::MalformedHistory { .. }));
    }

    #[test]
    fn test_load_unknown_role() {
        let (_dir, store) =
            store_with(r#"[{"role": "tool", "content": "42"}]"#);
        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::MalformedHistory { .. }));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");
        let err = TranscriptStore::open(&path).unwrap_err();
        match err {
            Error::HistoryNotFound(missing) => assert_eq!(missing, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.json");
        let store = TranscriptStore::create(&path).unwrap();
        assert!(store.load().unwrap().is_empty());

        // An existing file is left untouched.
        store.save(&[Message::user("keep me")]).unwrap();
        let store = TranscriptStore::create(&path).unwrap();
        assert_eq!(store.load().unwrap(), [Message::user("keep me")]);
    }

    #[test]
    fn test_into_model_message() {
        let msg = ModelMessage::from(&Message::assistant("Hi"));
        assert_eq!(msg, ModelMessage::Assistant("Hi".to_owned()));
    }
}
