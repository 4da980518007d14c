use std::path::PathBuf;

use parley_core::credential::DEFAULT_API_KEY_ENV;
use parley_core::{
    ChatClient, ChatClientBuilder, Credential, Echo, Error, TranscriptStore,
};
use parley_openai_model::{OpenAIConfigBuilder, OpenAIProvider};

/// A chatbot talking to an OpenAI-compatible endpoint.
pub type OpenAIChatbot = ChatClient;

/// An [`OpenAIChatbot`] builder.
///
/// Building never calls the endpoint. It checks the transcript file, then
/// resolves the API key, then loads the transcript, and stops at the first
/// failure.
#[derive(Debug)]
pub struct OpenAIChatbotBuilder {
    model: String,
    history_path: PathBuf,
    create_history: bool,
    system_prompt: Option<String>,
    api_key: Option<String>,
    api_key_env: Option<String>,
    base_url: Option<String>,
    echo: Option<Echo>,
}

impl OpenAIChatbotBuilder {
    /// Creates a builder for `model` that keeps the conversation in the
    /// file at `history_path`.
    pub fn new<M: Into<String>, P: Into<PathBuf>>(
        model: M,
        history_path: P,
    ) -> Self {
        Self {
            model: model.into(),
            history_path: history_path.into(),
            create_history: false,
            system_prompt: None,
            api_key: None,
            api_key_env: Some(DEFAULT_API_KEY_ENV.to_owned()),
            base_url: None,
            echo: None,
        }
    }

    /// Sets the system prompt that starts a new conversation.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the API key explicitly.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Reads the API key from `var` when none is set explicitly.
    #[inline]
    pub fn with_api_key_env<S: Into<String>>(mut self, var: S) -> Self {
        self.api_key_env = Some(var.into());
        self
    }

    /// Never reads the API key from the environment.
    #[inline]
    pub fn without_env_fallback(mut self) -> Self {
        self.api_key_env = None;
        self
    }

    /// Points the chatbot at an alternative endpoint.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Echoes replies to `echo`.
    #[inline]
    pub fn with_echo(mut self, echo: Echo) -> Self {
        self.echo = Some(echo);
        self
    }

    /// Creates the transcript file with an empty conversation if it is
    /// missing, instead of failing.
    #[inline]
    pub fn create_history_if_missing(mut self) -> Self {
        self.create_history = true;
        self
    }

    /// Builds a new chatbot.
    pub fn build(self) -> Result<OpenAIChatbot, Error> {
        let store = if self.create_history {
            TranscriptStore::create(self.history_path)?
        } else {
            TranscriptStore::open(self.history_path)?
        };
        let credential =
            Credential::resolve(self.api_key, self.api_key_env.as_deref())?;

        let mut config = OpenAIConfigBuilder::with_api_key(
            credential.into_inner(),
        )
        .with_model(self.model);
        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }
        let config = config.build();
        debug!(
            model = config.model(),
            base_url = config.base_url(),
            history = %store.path().display(),
            "building chatbot"
        );

        let mut client_builder = ChatClientBuilder::with_store(store);
        if let Some(prompt) = self.system_prompt {
            client_builder = client_builder.with_system_prompt(prompt);
        }
        if let Some(echo) = self.echo {
            client_builder = client_builder.with_echo(echo);
        }
        client_builder.build(OpenAIProvider::new(config))
    }
}
