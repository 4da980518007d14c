use parley_model::{ModelMessage, ModelProvider, ModelRequest};

use crate::chatbot::Chatbot;
use crate::echo::Echo;
use crate::error::Error;
use crate::model_client::{ModelClient, ProviderFailure};
use crate::transcript::{Message, TranscriptStore};

/// The system prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// [`ChatClient`] builder.
#[derive(Debug)]
pub struct ChatClientBuilder {
    store: TranscriptStore,
    system_prompt: Option<String>,
    echo: Option<Echo>,
}

impl ChatClientBuilder {
    /// Creates a builder over an opened transcript store.
    #[inline]
    pub fn with_store(store: TranscriptStore) -> Self {
        Self {
            store,
            system_prompt: None,
            echo: None,
        }
    }

    /// Sets the system prompt that starts a new transcript.
    ///
    /// It is ignored when the persisted transcript is not empty.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Echoes replies to `echo`.
    #[inline]
    pub fn with_echo(mut self, echo: Echo) -> Self {
        self.echo = Some(echo);
        self
    }

    /// Loads the transcript and builds the client.
    pub fn build<P: ModelProvider + 'static>(
        self,
        provider: P,
    ) -> Result<ChatClient, Error> {
        let mut history = self.store.load()?;
        if history.is_empty() {
            let prompt = self
                .system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_owned());
            history.push(Message::system(prompt));
        }

        Ok(ChatClient {
            model_client: ModelClient::new(provider),
            store: self.store,
            history,
            echo: self.echo,
        })
    }
}

/// A chat client that keeps a linear transcript on disk.
///
/// Every turn sends the whole transcript to the model, appends the reply
/// and rewrites the transcript file.
#[derive(Debug)]
pub struct ChatClient {
    model_client: ModelClient,
    store: TranscriptStore,
    history: Vec<Message>,
    echo: Option<Echo>,
}

impl ChatClient {
    /// Returns the transcript store backing this client.
    #[inline]
    pub fn store(&self) -> &TranscriptStore {
        &self.store
    }

    async fn complete(
        &mut self,
        message: &str,
        stream: bool,
    ) -> Result<String, Error> {
        self.history.push(Message::user(message));
        let request = ModelRequest {
            messages: self.history.iter().map(ModelMessage::from).collect(),
            stream,
        };
        debug!(messages = request.messages.len(), stream, "starting a turn");

        let echo = self.echo.clone().filter(|_| stream);
        let resp = self
            .model_client
            .send_request(request, move |delta| {
                if let Some(echo) = &echo {
                    echo.fragment(&delta);
                }
            })
            .await
            .map_err(|ProviderFailure { kind, source }| {
                warn!(%kind, "turn failed: {source}");
                Error::Connection { kind, source }
            })?;

        let reply = resp.transcript;
        self.history.push(Message::assistant(reply.clone()));
        self.save_history()?;
        Ok(reply)
    }
}

impl Chatbot for ChatClient {
    async fn chat(&mut self, message: &str) -> Result<String, Error> {
        let reply = self.complete(message, false).await?;
        if let Some(echo) = &self.echo {
            echo.line(&reply);
        }
        Ok(reply)
    }

    async fn chat_stream(&mut self, message: &str) -> Result<String, Error> {
        let result = self.complete(message, true).await;
        if let Some(echo) = &self.echo {
            // Fragments were written without separators, end the line.
            echo.line("");
        }
        result
    }

    #[inline]
    fn history(&self) -> &[Message] {
        &self.history
    }

    #[inline]
    fn save_history(&self) -> Result<(), Error> {
        self.store.save(&self.history)
    }
}
