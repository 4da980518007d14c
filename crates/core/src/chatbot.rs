use crate::Error;
use crate::transcript::Message;

/// The capability of holding a conversation with a model.
///
/// Each turn appends the user message and the reply to the history and
/// persists it. Turns take `&mut self`, so they run one at a time.
pub trait Chatbot {
    /// Sends `message` and waits for the whole reply.
    fn chat(
        &mut self,
        message: &str,
    ) -> impl Future<Output = Result<String, Error>> + Send;

    /// Sends `message` and receives the reply in fragments, which are
    /// concatenated in arrival order.
    fn chat_stream(
        &mut self,
        message: &str,
    ) -> impl Future<Output = Result<String, Error>> + Send;

    /// Returns the conversation so far.
    fn history(&self) -> &[Message];

    /// Writes the conversation to its transcript file.
    fn save_history(&self) -> Result<(), Error>;
}
