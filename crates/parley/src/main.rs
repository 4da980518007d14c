//! A terminal chat program built on top of `parley` as a library.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use parley::core::{Chatbot, Echo};
use parley::{OpenAIChatbot, OpenAIChatbotBuilder};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt};

const BAR_CHAR: &str = "▎";
const EXIT_COMMAND: &str = "/exit";

/// Chat with an OpenAI-compatible model, keeping the conversation in a
/// JSON file.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Model identifier.
    #[arg(long, env = "PARLEY_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Conversation file, a JSON list of messages.
    #[arg(long, env = "PARLEY_HISTORY", default_value = "chat_history.json")]
    history: PathBuf,

    /// System prompt for a new conversation.
    #[arg(long)]
    system_prompt: Option<String>,

    /// API key for the endpoint.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Alternative endpoint base URL.
    #[arg(long, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// Wait for whole replies instead of streaming them.
    #[arg(long)]
    no_stream: bool,

    /// Create the conversation file if it doesn't exist.
    #[arg(long)]
    create: bool,

    /// Send a single message and exit.
    message: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".bright_red().bold(), describe(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let stream = !cli.no_stream;

    let mut builder = OpenAIChatbotBuilder::new(cli.model, cli.history);
    if let Some(prompt) = cli.system_prompt {
        builder = builder.with_system_prompt(prompt);
    }
    if let Some(api_key) = cli.api_key {
        builder = builder.with_api_key(api_key);
    }
    if let Some(base_url) = cli.base_url {
        builder = builder.with_base_url(base_url);
    }
    if cli.create {
        builder = builder.create_history_if_missing();
    }
    if stream {
        // Non-streaming replies are printed here, after the spinner.
        builder = builder.with_echo(Echo::stdout());
    }
    let mut chatbot = builder.build()?;

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")?
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let mut turn = Turn {
        chatbot: &mut chatbot,
        stream,
        progress_style,
    };

    if let Some(message) = cli.message {
        return turn.send(&message).await;
    }

    let stdin = io::BufReader::new(io::stdin());
    chat_loop(stdin, &mut turn).await
}

/// Formats an error for the terminal.
///
/// Our errors already carry their cause in the message, so the source chain
/// is not appended.
fn describe(err: &anyhow::Error) -> String {
    err.to_string()
}

/// Runs one turn per input line until EOF or the exit command.
async fn chat_loop<R: AsyncBufRead + Unpin>(
    input: R,
    turn: &mut Turn<'_>,
) -> anyhow::Result<()> {
    let mut lines = input.lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!("error reading input: {}", err);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == EXIT_COMMAND {
            break;
        }

        if let Err(err) = turn.send(line).await {
            eprintln!("{}", describe(&err).bright_red());
        }
        println!();
    }

    Ok(())
}

struct Turn<'a> {
    chatbot: &'a mut OpenAIChatbot,
    stream: bool,
    progress_style: ProgressStyle,
}

impl Turn<'_> {
    async fn send(&mut self, message: &str) -> anyhow::Result<()> {
        if self.stream {
            print!("{}🤖 ", BAR_CHAR.bright_cyan());
            std::io::stdout().flush()?;
            self.chatbot.chat_stream(message).await?;
            return Ok(());
        }

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(self.progress_style.clone());
        progress_bar.set_message("🤔 Thinking...");
        progress_bar.enable_steady_tick(Duration::from_millis(100));

        let result = self.chatbot.chat(message).await;

        // Finish the progress bar before printing anything else.
        progress_bar.finish_and_clear();

        let reply = result?;
        println!("{}🤖 {}", BAR_CHAR.bright_cyan(), reply.bright_white());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use parley::core::{ChatClientBuilder, Message, TranscriptStore};
    use parley_test_model::{PresetResponse, TestModelProvider};
    use tempfile::TempDir;

    use super::*;

    fn chatbot_with(
        dir: &TempDir,
        provider: TestModelProvider,
    ) -> OpenAIChatbot {
        let path = dir.path().join("history.json");
        fs::write(&path, "[]").unwrap();
        ChatClientBuilder::with_store(TranscriptStore::open(path).unwrap())
            .build(provider)
            .unwrap()
    }

    fn turn_for(chatbot: &mut OpenAIChatbot) -> Turn<'_> {
        Turn {
            chatbot,
            stream: false,
            progress_style: ProgressStyle::default_spinner(),
        }
    }

    #[tokio::test]
    async fn test_every_piped_line_is_a_turn() {
        let dir = TempDir::new().unwrap();
        let mut provider = TestModelProvider::default();
        for reply in ["one", "two", "three"] {
            provider.add_response(PresetResponse::with_deltas([reply]));
        }
        let mut chatbot = chatbot_with(&dir, provider.clone());

        let input: &[u8] = b"first\nsecond\n\n  \nthird\n";
        chat_loop(input, &mut turn_for(&mut chatbot)).await.unwrap();

        assert_eq!(provider.requests().len(), 3);
        let users: Vec<_> = chatbot
            .history()
            .iter()
            .filter(|msg| msg.role == parley::core::Role::User)
            .map(|msg| msg.content.as_str())
            .collect();
        assert_eq!(users, ["first", "second", "third"]);
        assert_eq!(chatbot.history().last(), Some(&Message::assistant("three")));
    }

    #[tokio::test]
    async fn test_exit_command_stops_reading() {
        let dir = TempDir::new().unwrap();
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_deltas(["ok"]));
        provider.add_response(PresetResponse::with_deltas(["unused"]));
        let mut chatbot = chatbot_with(&dir, provider.clone());

        let input: &[u8] = b"hello\n/exit\nnever sent\n";
        chat_loop(input, &mut turn_for(&mut chatbot)).await.unwrap();

        assert_eq!(provider.requests().len(), 1);
        assert_eq!(provider.remaining_responses(), 1);
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_the_loop_going() {
        let dir = TempDir::new().unwrap();
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::failing());
        provider.add_response(PresetResponse::with_deltas(["recovered"]));
        let mut chatbot = chatbot_with(&dir, provider.clone());

        let input: &[u8] = b"first\nsecond\n";
        chat_loop(input, &mut turn_for(&mut chatbot)).await.unwrap();

        assert_eq!(provider.requests().len(), 2);
        assert_eq!(
            chatbot.history().last(),
            Some(&Message::assistant("recovered"))
        );
    }

    #[tokio::test]
    async fn test_connection_error_cause_shown_once() {
        let dir = TempDir::new().unwrap();
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::failing());
        let mut chatbot = chatbot_with(&dir, provider);

        let err = turn_for(&mut chatbot).send("Hello").await.unwrap_err();
        let message = describe(&err);

        assert!(
            message.starts_with("error communicating with the model provider")
        );
        assert_eq!(message.matches("preset failure").count(), 1);
    }
}
